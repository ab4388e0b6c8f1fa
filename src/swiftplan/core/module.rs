use std::path::{Path, PathBuf};
use swiftplan_platform::BuildCondition;

use crate::core::graph::ModuleDependency;
use crate::core::package::PackageIdentity;

/// A unit of compilation in the resolved graph: a group of source files
/// compiled together, or a pre-built or scripted stand-in for one.
#[derive(Clone, Debug)]
pub struct ResolvedModule {
    name: String,
    kind: ModuleKind,
    package: PackageIdentity,
    sources: Vec<PathBuf>,
    /// Public headers directory of a C-family module.
    public_headers_dir: Option<PathBuf>,
    module_map: ModuleMapType,
    settings: BuildSettings,
    dependencies: Vec<ModuleDependency>,
    resources: Vec<PathBuf>,
    c_language_standard: Option<String>,
    cxx_language_standard: Option<String>,
}

/// What a module is, which decides how (or whether) it compiles and
/// whether depending on it pulls the dependent subtree to the host
/// destination.
#[derive(Clone, Debug, PartialEq)]
pub enum ModuleKind {
    SwiftLibrary,
    SwiftExecutable,
    SwiftTest,
    /// A single-file example program; compiles like an executable.
    SwiftSnippet,
    /// A compiler macro implementation; always built for the host.
    SwiftMacro,
    ClangLibrary,
    /// A header-only wrapper over a library installed on the system.
    SystemLibrary {
        pkg_config_name: Option<String>,
        pkg_config: Option<PkgConfigPaths>,
        providers: Vec<SystemPackageProvider>,
    },
    /// A pre-built artifact directory with per-triple variants.
    BinaryArtifact { path: PathBuf },
    /// A build-tool script; never compiled into objects, always host.
    Plugin,
}

/// Include and link paths resolved by a pkg-config lookup done by an
/// external collaborator. The engine only stores and replays them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PkgConfigPaths {
    pub include_paths: Vec<PathBuf>,
    pub library_paths: Vec<PathBuf>,
    pub libraries: Vec<String>,
}

/// A system packager that can install a missing system library.
#[derive(Clone, Debug, PartialEq)]
pub enum SystemPackageProvider {
    Brew(Vec<String>),
    Apt(Vec<String>),
    Yum(Vec<String>),
    Pkg(Vec<String>),
}

impl SystemPackageProvider {
    /// An installation hint such as `brew install openssl`.
    pub fn installation_hint(&self) -> String {
        let (tool, packages) = match self {
            SystemPackageProvider::Brew(p) => ("brew install", p),
            SystemPackageProvider::Apt(p) => ("apt-get install", p),
            SystemPackageProvider::Yum(p) => ("yum install", p),
            SystemPackageProvider::Pkg(p) => ("pkg install", p),
        };
        format!("{} {}", tool, packages.join(" "))
    }
}

/// How a C-family module's headers are exposed to modules-aware
/// compilers.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ModuleMapType {
    /// No module map, and none can be synthesized.
    #[default]
    None,
    /// The module ships its own `module.modulemap`.
    Custom(PathBuf),
    /// Synthesize a map around a single umbrella header.
    UmbrellaHeader(PathBuf),
    /// Synthesize a map around the public headers directory.
    UmbrellaDirectory(PathBuf),
}

/// C/C++ interoperability mode of a Swift module.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum InteropMode {
    #[default]
    C,
    Cxx,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DefaultIsolation {
    MainActor,
    Nonisolated,
}

/// A declared build setting together with the condition restricting it,
/// kept in manifest order.
#[derive(Clone, Debug, PartialEq)]
pub struct Conditional<T> {
    pub value: T,
    pub condition: Option<BuildCondition>,
}

impl<T> Conditional<T> {
    pub fn always(value: T) -> Conditional<T> {
        Conditional {
            value,
            condition: None,
        }
    }

    pub fn when(value: T, condition: BuildCondition) -> Conditional<T> {
        Conditional {
            value,
            condition: Some(condition),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SwiftSetting {
    Define(String),
    HeaderSearchPath(String),
    UnsafeFlags(Vec<String>),
    InteroperabilityMode(InteropMode),
    UpcomingFeature(String),
    ExperimentalFeature(String),
    LanguageVersion(String),
    DefaultIsolation(DefaultIsolation),
    StrictMemorySafety,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ClangSetting {
    Define(String),
    HeaderSearchPath(String),
    UnsafeFlags(Vec<String>),
}

/// Declared per-tool build settings, each list in manifest order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BuildSettings {
    pub swift: Vec<Conditional<SwiftSetting>>,
    pub c: Vec<Conditional<ClangSetting>>,
    pub cxx: Vec<Conditional<ClangSetting>>,
    pub linker: Vec<Conditional<crate::core::product::LinkerSetting>>,
}

impl ResolvedModule {
    pub fn new(name: &str, kind: ModuleKind, package: PackageIdentity) -> ResolvedModule {
        ResolvedModule {
            name: name.to_string(),
            kind,
            package,
            sources: Vec::new(),
            public_headers_dir: None,
            module_map: ModuleMapType::None,
            settings: BuildSettings::default(),
            dependencies: Vec::new(),
            resources: Vec::new(),
            c_language_standard: None,
            cxx_language_standard: None,
        }
    }

    pub fn with_sources(mut self, sources: Vec<PathBuf>) -> ResolvedModule {
        self.sources = sources;
        self
    }

    pub fn with_public_headers_dir(mut self, dir: impl Into<PathBuf>) -> ResolvedModule {
        self.public_headers_dir = Some(dir.into());
        self
    }

    pub fn with_module_map(mut self, module_map: ModuleMapType) -> ResolvedModule {
        self.module_map = module_map;
        self
    }

    pub fn with_settings(mut self, settings: BuildSettings) -> ResolvedModule {
        self.settings = settings;
        self
    }

    pub fn with_dependencies(mut self, dependencies: Vec<ModuleDependency>) -> ResolvedModule {
        self.dependencies = dependencies;
        self
    }

    pub fn with_resources(mut self, resources: Vec<PathBuf>) -> ResolvedModule {
        self.resources = resources;
        self
    }

    pub fn with_c_language_standard(mut self, std: &str) -> ResolvedModule {
        self.c_language_standard = Some(std.to_string());
        self
    }

    pub fn with_cxx_language_standard(mut self, std: &str) -> ResolvedModule {
        self.cxx_language_standard = Some(std.to_string());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The module name with characters not valid in an identifier
    /// replaced, as used for `-module-name` and entry-point symbols.
    pub fn c99_name(&self) -> String {
        self.name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect()
    }

    pub fn kind(&self) -> &ModuleKind {
        &self.kind
    }

    pub fn package(&self) -> &PackageIdentity {
        &self.package
    }

    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    pub fn public_headers_dir(&self) -> Option<&Path> {
        self.public_headers_dir.as_deref()
    }

    pub fn module_map(&self) -> &ModuleMapType {
        &self.module_map
    }

    pub fn settings(&self) -> &BuildSettings {
        &self.settings
    }

    pub fn dependencies(&self) -> &[ModuleDependency] {
        &self.dependencies
    }

    pub fn resources(&self) -> &[PathBuf] {
        &self.resources
    }

    pub fn c_language_standard(&self) -> Option<&str> {
        self.c_language_standard.as_deref()
    }

    pub fn cxx_language_standard(&self) -> Option<&str> {
        self.cxx_language_standard.as_deref()
    }

    pub fn is_swift(&self) -> bool {
        matches!(
            self.kind,
            ModuleKind::SwiftLibrary
                | ModuleKind::SwiftExecutable
                | ModuleKind::SwiftTest
                | ModuleKind::SwiftSnippet
                | ModuleKind::SwiftMacro
        )
    }

    pub fn is_clang(&self) -> bool {
        self.kind == ModuleKind::ClangLibrary
    }

    /// Whether this module produces object files.
    pub fn is_compiled(&self) -> bool {
        self.is_swift() || self.is_clang()
    }

    pub fn is_test(&self) -> bool {
        self.kind == ModuleKind::SwiftTest
    }

    pub fn is_snippet(&self) -> bool {
        self.kind == ModuleKind::SwiftSnippet
    }

    /// Whether this module provides a program entry point.
    pub fn is_executable(&self) -> bool {
        matches!(
            self.kind,
            ModuleKind::SwiftExecutable | ModuleKind::SwiftSnippet | ModuleKind::SwiftMacro
        )
    }

    /// Macro and plugin modules run during the build, so depending on one
    /// pulls it (and its subtree) to the host destination.
    pub fn builds_for_host(&self) -> bool {
        matches!(self.kind, ModuleKind::SwiftMacro | ModuleKind::Plugin)
    }

    /// Whether any source is C++ (drives the C++ runtime link decision).
    pub fn has_cxx_sources(&self) -> bool {
        self.sources.iter().any(|s| {
            matches!(
                s.extension().and_then(|e| e.to_str()),
                Some("cpp" | "cc" | "cxx" | "mm")
            )
        })
    }
}
