use anyhow::bail;
use serde::Serialize;
use std::path::PathBuf;
use swiftplan_platform::{BuildEnvironment, Configuration, Triple};

use crate::core::plan::Destination;
use crate::util::errors::PlanResult;

/// Everything the engine needs to know about one build destination:
/// where outputs go, what configuration and triple are in effect, and the
/// knobs that shape compile and link command lines.
#[derive(Clone, Debug)]
pub struct BuildParameters {
    pub data_path: PathBuf,
    pub configuration: Configuration,
    pub triple: Triple,
    pub destination: Destination,
    /// Parallel compiler jobs, emitted as `-j<N>`.
    pub workers: u32,
    pub flags: Flags,
    pub index_store_mode: IndexStoreMode,
    pub debugging: DebuggingParameters,
    pub driver: DriverParameters,
    pub linking: LinkingParameters,
    pub sanitizers: Vec<Sanitizer>,
}

/// Extra pass-through options supplied by the user, applied after all
/// engine-chosen flags.
#[derive(Clone, Debug, Default)]
pub struct Flags {
    pub cc: Vec<String>,
    pub cxx: Vec<String>,
    pub swift: Vec<String>,
    pub linker: Vec<String>,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum IndexStoreMode {
    #[default]
    Auto,
    On,
    Off,
}

impl IndexStoreMode {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, IndexStoreMode::Off)
    }
}

#[derive(Clone, Debug, Default)]
pub struct DebuggingParameters {
    /// Tri-state frame-pointer policy: `None` keeps the platform default
    /// (Linux keeps frame pointers).
    pub omit_frame_pointers: Option<bool>,
}

#[derive(Clone, Debug, Default)]
pub struct DriverParameters {
    pub explicit_module_build: bool,
    /// Allow renaming `main` so that several entry points can coexist in
    /// one test runner process.
    pub can_rename_entrypoint_function_name: bool,
}

#[derive(Clone, Debug)]
pub struct LinkingParameters {
    pub dead_strip: bool,
    pub lto: Option<LtoMode>,
    pub disable_local_rpath: bool,
    pub link_static_swift_stdlib: bool,
}

impl Default for LinkingParameters {
    fn default() -> LinkingParameters {
        LinkingParameters {
            dead_strip: true,
            lto: None,
            disable_local_rpath: false,
            link_static_swift_stdlib: false,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LtoMode {
    Full,
    Thin,
}

impl LtoMode {
    pub fn swift_flag(&self) -> &'static str {
        match self {
            LtoMode::Full => "-lto=llvm-full",
            LtoMode::Thin => "-lto=llvm-thin",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sanitizer {
    Address,
    Thread,
    Undefined,
    Scudo,
}

impl Sanitizer {
    pub fn name(&self) -> &'static str {
        match self {
            Sanitizer::Address => "address",
            Sanitizer::Thread => "thread",
            Sanitizer::Undefined => "undefined",
            Sanitizer::Scudo => "scudo",
        }
    }
}

impl BuildParameters {
    pub fn new(
        data_path: impl Into<PathBuf>,
        configuration: Configuration,
        triple: Triple,
        destination: Destination,
    ) -> BuildParameters {
        BuildParameters {
            data_path: data_path.into(),
            configuration,
            triple,
            destination,
            workers: 1,
            flags: Flags::default(),
            index_store_mode: IndexStoreMode::default(),
            debugging: DebuggingParameters::default(),
            driver: DriverParameters::default(),
            linking: LinkingParameters::default(),
            sanitizers: Vec::new(),
        }
    }

    pub fn validate(&self) -> PlanResult<()> {
        if self.workers == 0 {
            bail!("workers must be at least 1");
        }
        Ok(())
    }

    /// The environment dependency conditions are evaluated against for
    /// this destination.
    pub fn build_environment(&self) -> BuildEnvironment {
        match self.triple.platform() {
            Some(platform) => BuildEnvironment::new(platform, self.configuration),
            None => BuildEnvironment::bare(self.configuration),
        }
    }

    pub fn is_debug(&self) -> bool {
        self.configuration == Configuration::Debug
    }

    /// Whether frame pointers are kept for this build. Linux keeps them
    /// unless explicitly overridden; elsewhere the toolchain default
    /// stands unless overridden.
    pub fn keeps_frame_pointers(&self) -> Option<bool> {
        match self.debugging.omit_frame_pointers {
            Some(omit) => Some(!omit),
            None if self.triple.is_linux() => Some(true),
            None => None,
        }
    }
}
