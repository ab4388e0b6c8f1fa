use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// The toolchain the plan's invocations will run. The engine never
/// executes anything; it only needs the tool locations and the answers to
/// "does this compiler support flag X?" probes, which the constructor of
/// this record is expected to have resolved.
#[derive(Clone, Debug)]
pub struct Toolchain {
    swift_compiler: PathBuf,
    clang_compiler: PathBuf,
    librarian: PathBuf,
    /// Swift resource directory (`.../usr/lib/swift`).
    resources_path: Option<PathBuf>,
    sdk_root: Option<PathBuf>,
    /// Flags probed as unsupported by the current compiler; everything
    /// else is assumed supported.
    unsupported_flags: HashSet<String>,
}

impl Toolchain {
    pub fn new(
        swift_compiler: impl Into<PathBuf>,
        clang_compiler: impl Into<PathBuf>,
        librarian: impl Into<PathBuf>,
    ) -> Toolchain {
        Toolchain {
            swift_compiler: swift_compiler.into(),
            clang_compiler: clang_compiler.into(),
            librarian: librarian.into(),
            resources_path: None,
            sdk_root: None,
            unsupported_flags: HashSet::new(),
        }
    }

    pub fn with_resources_path(mut self, path: impl Into<PathBuf>) -> Toolchain {
        self.resources_path = Some(path.into());
        self
    }

    pub fn with_sdk_root(mut self, path: impl Into<PathBuf>) -> Toolchain {
        self.sdk_root = Some(path.into());
        self
    }

    /// Record that a probe found `flag` unsupported.
    pub fn without_flag(mut self, flag: &str) -> Toolchain {
        self.unsupported_flags.insert(flag.to_string());
        self
    }

    pub fn swift_compiler(&self) -> &Path {
        &self.swift_compiler
    }

    pub fn clang_compiler(&self) -> &Path {
        &self.clang_compiler
    }

    pub fn librarian(&self) -> &Path {
        &self.librarian
    }

    pub fn resources_path(&self) -> Option<&Path> {
        self.resources_path.as_deref()
    }

    pub fn sdk_root(&self) -> Option<&Path> {
        self.sdk_root.as_deref()
    }

    pub fn supports_flag(&self, flag: &str) -> bool {
        !self.unsupported_flags.contains(flag)
    }

    /// Run-path entry for the Swift runtime when linking macOS binaries
    /// against the dynamic standard library.
    pub fn macos_swift_stdlib_rpath(&self) -> Option<PathBuf> {
        self.resources_path.as_ref().map(|p| p.join("macosx"))
    }
}
