//! Per-(module, destination) build descriptions.
//!
//! Each resolved module that appears in the plan gets a description
//! tagged by its language family. The variants share a small capability
//! surface — objects, compile arguments, module map, output paths — and
//! a variant that does not participate in a capability returns empty
//! rather than erroring, so consumers can iterate uniformly.

use std::path::PathBuf;
use std::sync::Arc;
use swiftplan_platform::BuildEnvironment;

use crate::core::module::{ModuleKind, ModuleMapType, ResolvedModule, SwiftSetting};
use crate::core::plan::layout::Layout;
use crate::core::plan::Destination;
use crate::util::errors::PlanResult;
use crate::util::Invocation;

pub use self::binary::BinaryModuleBuildDescription;
pub use self::clang::ClangModuleBuildDescription;
pub use self::plugin::PluginModuleBuildDescription;
pub use self::swift::SwiftModuleBuildDescription;
pub use self::system::SystemModuleBuildDescription;

pub mod binary;
pub mod clang;
pub mod plugin;
pub mod swift;
pub mod system;

#[derive(Debug)]
pub enum ModuleBuildDescription {
    Swift(SwiftModuleBuildDescription),
    Clang(ClangModuleBuildDescription),
    Binary(BinaryModuleBuildDescription),
    Plugin(PluginModuleBuildDescription),
    System(SystemModuleBuildDescription),
}

impl ModuleBuildDescription {
    pub fn module(&self) -> &Arc<ResolvedModule> {
        match self {
            ModuleBuildDescription::Swift(d) => d.module(),
            ModuleBuildDescription::Clang(d) => d.module(),
            ModuleBuildDescription::Binary(d) => d.module(),
            ModuleBuildDescription::Plugin(d) => d.module(),
            ModuleBuildDescription::System(d) => d.module(),
        }
    }

    pub fn destination(&self) -> Destination {
        match self {
            ModuleBuildDescription::Swift(d) => d.destination(),
            ModuleBuildDescription::Clang(d) => d.destination(),
            ModuleBuildDescription::Binary(d) => d.destination(),
            ModuleBuildDescription::Plugin(d) => d.destination(),
            ModuleBuildDescription::System(d) => d.destination(),
        }
    }

    /// Object files this module contributes to links.
    pub fn objects(&self) -> Vec<PathBuf> {
        match self {
            ModuleBuildDescription::Swift(d) => d.objects().to_vec(),
            ModuleBuildDescription::Clang(d) => d.objects().to_vec(),
            _ => Vec::new(),
        }
    }

    /// The compile command line, for compiled variants.
    pub fn compile_arguments(&self) -> Vec<String> {
        match self {
            ModuleBuildDescription::Swift(d) => d.compile_arguments(),
            ModuleBuildDescription::Clang(d) => d.common_arguments().to_vec(),
            _ => Vec::new(),
        }
    }

    /// The concrete invocations a build executor must run for this
    /// module, in order.
    pub fn invocations(&self) -> Vec<Invocation> {
        match self {
            ModuleBuildDescription::Swift(d) => d.invocations(),
            ModuleBuildDescription::Clang(d) => d.invocations(),
            _ => Vec::new(),
        }
    }

    /// The module map consumers must import, if any.
    pub fn module_map(&self) -> Option<PathBuf> {
        match self {
            ModuleBuildDescription::Clang(d) => d.module_map_path().map(PathBuf::from),
            ModuleBuildDescription::System(d) => Some(d.module_map_path().to_path_buf()),
            _ => None,
        }
    }

    /// Everything this description produces, for downstream bookkeeping.
    pub fn output_paths(&self) -> Vec<PathBuf> {
        match self {
            ModuleBuildDescription::Swift(d) => d.output_paths(),
            ModuleBuildDescription::Clang(d) => d.objects().to_vec(),
            _ => Vec::new(),
        }
    }
}

/// The module map a dependency exposes: its own, or the one synthesized
/// into its build directory.
pub(crate) fn dependency_module_map(
    module: &ResolvedModule,
    layout: &Layout,
) -> Option<PathBuf> {
    match module.module_map() {
        ModuleMapType::Custom(path) => Some(path.clone()),
        ModuleMapType::UmbrellaHeader(_) | ModuleMapType::UmbrellaDirectory(_) => {
            Some(layout.synthesized_module_map(module.name()))
        }
        ModuleMapType::None => match module.kind() {
            ModuleKind::ClangLibrary if module.public_headers_dir().is_some() => {
                Some(layout.synthesized_module_map(module.name()))
            }
            _ => None,
        },
    }
}

/// Whether the module opts into the embedded experimental feature in the
/// given environment; propagates onto the link line of consuming
/// products.
pub(crate) fn enables_embedded(module: &ResolvedModule, env: &BuildEnvironment) -> bool {
    module.settings().swift.iter().any(|setting| {
        matches!(&setting.value, SwiftSetting::ExperimentalFeature(name) if name == "Embedded")
            && setting
                .condition
                .as_ref()
                .map_or(true, |c| c.satisfied_by(env))
    })
}

/// One object path per compilable source, under the module's build
/// directory.
pub(crate) fn object_paths(
    sources: &[PathBuf],
    build_dir: &PathBuf,
    extension: &str,
) -> PlanResult<Vec<PathBuf>> {
    let mut objects = Vec::new();
    for source in sources {
        let stem = source
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| anyhow::format_err!("source `{}` has no stem", source.display()))?;
        objects.push(build_dir.join(format!("{stem}.{extension}")));
    }
    Ok(objects)
}
