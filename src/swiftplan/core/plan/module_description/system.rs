use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::module::{ModuleKind, ModuleMapType, PkgConfigPaths, ResolvedModule};
use crate::core::plan::Destination;
use crate::util::errors::PlanResult;
use crate::util::Diagnostics;

/// Build description of a system-library module. Nothing compiles; the
/// description carries the module map reference and whatever include and
/// library paths the pkg-config lookup resolved upstream. A failed
/// lookup with declared providers produces a warning with an
/// installation hint, never an error.
#[derive(Debug)]
pub struct SystemModuleBuildDescription {
    module: Arc<ResolvedModule>,
    destination: Destination,
    module_map_path: PathBuf,
    pkg_config: Option<PkgConfigPaths>,
}

impl SystemModuleBuildDescription {
    pub(crate) fn new(
        module: Arc<ResolvedModule>,
        destination: Destination,
        diagnostics: &mut Diagnostics,
    ) -> PlanResult<SystemModuleBuildDescription> {
        let (pkg_config_name, pkg_config, providers) = match module.kind() {
            ModuleKind::SystemLibrary {
                pkg_config_name,
                pkg_config,
                providers,
            } => (pkg_config_name.clone(), pkg_config.clone(), providers.clone()),
            other => anyhow::bail!(
                "module '{}' is not a system library (kind {:?})",
                module.name(),
                other
            ),
        };
        let module_map_path = match module.module_map() {
            ModuleMapType::Custom(path) => path.clone(),
            _ => anyhow::bail!(
                "system library '{}' provides no module map",
                module.name()
            ),
        };
        if pkg_config.is_none() {
            if let Some(name) = &pkg_config_name {
                let mut message = format!(
                    "couldn't find pkg-config information for '{name}' (module '{}')",
                    module.name()
                );
                for provider in &providers {
                    message.push_str(&format!(
                        "; you may be able to install it with `{}`",
                        provider.installation_hint()
                    ));
                }
                diagnostics.warn(message);
            }
        }
        Ok(SystemModuleBuildDescription {
            module,
            destination,
            module_map_path,
            pkg_config,
        })
    }

    pub fn module(&self) -> &Arc<ResolvedModule> {
        &self.module
    }

    pub fn destination(&self) -> Destination {
        self.destination
    }

    pub fn module_map_path(&self) -> &Path {
        &self.module_map_path
    }

    pub fn pkg_config(&self) -> Option<&PkgConfigPaths> {
        self.pkg_config.as_ref()
    }

    /// Linker inputs contributed to consuming products.
    pub fn linker_arguments(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(paths) = &self.pkg_config {
            for dir in &paths.library_paths {
                args.push("-L".to_string());
                args.push(dir.display().to_string());
            }
            for library in &paths.libraries {
                args.push(format!("-l{library}"));
            }
        }
        args
    }
}
