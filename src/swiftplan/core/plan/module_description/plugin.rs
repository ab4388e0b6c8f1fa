use std::path::PathBuf;
use std::sync::Arc;

use crate::core::module::ModuleKind;
use crate::core::module::ResolvedModule;
use crate::core::plan::closure::ClosureKind;
use crate::core::plan::module_description::binary;
use crate::core::plan::{Destination, PlanContext};
use crate::util::errors::PlanResult;

/// Build description of a plugin module. Plugins never compile into
/// objects; the plan records them on the host destination together with
/// the executable tools they can invoke, and the plan executor
/// materializes the commands they emit.
#[derive(Debug)]
pub struct PluginModuleBuildDescription {
    module: Arc<ResolvedModule>,
    /// Tools the plugin may run during the build, by name.
    tools: Vec<(String, PathBuf)>,
}

impl PluginModuleBuildDescription {
    pub(crate) fn new(
        cx: &PlanContext<'_>,
        module: Arc<ResolvedModule>,
    ) -> PlanResult<PluginModuleBuildDescription> {
        // Everything a plugin depends on runs during the build, so the
        // whole closure sits on the host destination.
        let closure =
            cx.resolver()
                .module_closure(&module, Destination::Host, ClosureKind::Compile)?;
        let mut tools = Vec::new();
        for (dep, _) in &closure.modules {
            match dep.kind() {
                ModuleKind::SwiftExecutable => {
                    let file = match cx.host_parameters.triple.executable_extension() {
                        "" => dep.name().to_string(),
                        ext => format!("{}.{}", dep.name(), ext),
                    };
                    tools.push((dep.name().to_string(), cx.host_layout.root().join(file)));
                }
                ModuleKind::BinaryArtifact { path } => {
                    let selected = binary::select_variant(cx, dep, path, Destination::Host)?;
                    if selected.kind() == binary::ArtifactKind::Executable {
                        tools.push((selected.name(), selected.path().to_path_buf()));
                    }
                }
                _ => {}
            }
        }
        Ok(PluginModuleBuildDescription { module, tools })
    }

    pub fn module(&self) -> &Arc<ResolvedModule> {
        &self.module
    }

    pub fn destination(&self) -> Destination {
        Destination::Host
    }

    pub fn tools(&self) -> &[(String, PathBuf)] {
        &self.tools
    }
}
