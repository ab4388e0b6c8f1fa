//! Build-plan construction.
//!
//! [`BuildPlan::new`] lowers the resolved graph into per-(module,
//! destination) and per-(product, destination) build descriptions. The
//! same module may legitimately appear twice — once per destination —
//! when it is reachable both at run time and through a macro or plugin
//! edge; consumers must always pass the destination when looking up a
//! description.

use indexmap::IndexMap;
use serde::Serialize;
use std::sync::Arc;
use swiftplan_platform::Triple;
use tracing::debug;

use crate::core::graph::PackageGraph;
use crate::core::module::{ModuleKind, ResolvedModule};
use crate::core::package::{Package, PackageIdentity};
use crate::core::product::{ProductKind, ResolvedProduct};
use crate::util::errors::PlanResult;
use crate::util::{Diagnostics, FileSystem};

pub use self::closure::{Closure, ClosureKind, ClosureResolver};
pub use self::layout::Layout;
pub use self::module_description::{
    BinaryModuleBuildDescription, ClangModuleBuildDescription, ModuleBuildDescription,
    PluginModuleBuildDescription, SwiftModuleBuildDescription, SystemModuleBuildDescription,
};
pub use self::parameters::{
    BuildParameters, DebuggingParameters, DriverParameters, Flags, IndexStoreMode,
    LinkingParameters, LtoMode, Sanitizer,
};
pub use self::product_description::ProductBuildDescription;
pub use self::serialize::{SerializedModule, SerializedPlan, SerializedProduct};
pub use self::toolchain::Toolchain;

pub mod closure;
pub mod layout;
pub mod module_description;
pub mod parameters;
pub mod product_description;
mod serialize;
pub mod toolchain;
mod validate;

/// Whether an artifact is built for the machine the user targets, or for
/// the machine running the build (macros, plugins, and their
/// dependencies). The two coincide only when not cross-compiling, and
/// even then they are planned separately.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    Target,
    Host,
}

/// Everything description builders need to see, bundled so signatures
/// stay small.
pub(crate) struct PlanContext<'a> {
    pub graph: &'a PackageGraph,
    pub toolchain: &'a Toolchain,
    pub target_parameters: &'a BuildParameters,
    pub host_parameters: &'a BuildParameters,
    pub target_layout: Layout,
    pub host_layout: Layout,
    pub fs: &'a dyn FileSystem,
}

impl<'a> PlanContext<'a> {
    pub fn parameters(&self, destination: Destination) -> &BuildParameters {
        match destination {
            Destination::Target => self.target_parameters,
            Destination::Host => self.host_parameters,
        }
    }

    pub fn layout(&self, destination: Destination) -> &Layout {
        match destination {
            Destination::Target => &self.target_layout,
            Destination::Host => &self.host_layout,
        }
    }

    pub fn resolver(&self) -> ClosureResolver<'a> {
        ClosureResolver::new(
            self.graph,
            self.target_parameters.build_environment(),
            self.host_parameters.build_environment(),
        )
    }

    /// The `-target` triple for a destination, version-qualified on
    /// Darwin from the package's declared minimum.
    pub fn qualified_triple(&self, destination: Destination, package: &Package) -> Triple {
        let triple = &self.parameters(destination).triple;
        if triple.is_darwin() && triple.version().is_none() {
            if let Some(platform) = triple.platform() {
                if let Some(version) = package.minimum_platform_version(platform) {
                    return triple.with_version(Some(version));
                }
            }
        }
        triple.clone()
    }
}

/// The finished plan: every description needed to build the graph, plus
/// the diagnostics accumulated on the way.
#[derive(Debug)]
pub struct BuildPlan {
    graph: PackageGraph,
    target_parameters: BuildParameters,
    host_parameters: BuildParameters,
    module_descriptions: IndexMap<(String, Destination), ModuleBuildDescription>,
    product_descriptions: IndexMap<(String, String, Destination), ProductBuildDescription>,
    diagnostics: Diagnostics,
}

impl BuildPlan {
    pub fn new(
        graph: &PackageGraph,
        target_parameters: BuildParameters,
        host_parameters: BuildParameters,
        toolchain: &Toolchain,
        fs: &dyn FileSystem,
    ) -> PlanResult<BuildPlan> {
        target_parameters.validate()?;
        host_parameters.validate()?;
        if target_parameters.destination != Destination::Target
            || host_parameters.destination != Destination::Host
        {
            anyhow::bail!("build parameters passed for the wrong destination");
        }

        let mut diagnostics = Diagnostics::new();
        let target_layout =
            Layout::new(&target_parameters.data_path, target_parameters.configuration);
        let host_layout = Layout::new(&host_parameters.data_path, host_parameters.configuration);

        // The plan works on its own copy of the graph so synthesized test
        // modules and products resolve like ordinary ones.
        let mut graph = graph.clone();
        derived_tests::synthesize(&mut graph, &target_parameters, &target_layout, fs)?;

        // Step 1: which (module, destination) and (product, destination)
        // pairs appear in any closure reachable from a root product.
        let mut planned_modules: IndexMap<(String, Destination), Arc<ResolvedModule>> =
            IndexMap::new();
        let mut planned_products: IndexMap<(String, String, Destination), Arc<ResolvedProduct>> =
            IndexMap::new();
        {
            let resolver = ClosureResolver::new(
                &graph,
                target_parameters.build_environment(),
                host_parameters.build_environment(),
            );
            for product in graph.root_products() {
                let destination = match product.kind() {
                    ProductKind::Plugin | ProductKind::Macro => Destination::Host,
                    _ => Destination::Target,
                };
                if product.kind() != ProductKind::Plugin {
                    planned_products.insert(product_key(&product, destination), product.clone());
                }
                let closure =
                    resolver.product_closure(&product, destination, ClosureKind::Compile)?;
                for (module, module_destination) in closure.modules {
                    planned_modules
                        .insert((module.name().to_string(), module_destination), module);
                }
                for (inner, inner_destination) in closure.products {
                    if inner.kind() != ProductKind::Plugin {
                        planned_products.insert(product_key(&inner, inner_destination), inner);
                    }
                }
            }
        }

        // Macro implementations load into the compiler as executables, so
        // any macro module the manifest leaves without a product gets one
        // synthesized on the host.
        let mut macro_products: Vec<ResolvedProduct> = Vec::new();
        for ((name, destination), module) in &planned_modules {
            if *destination != Destination::Host || *module.kind() != ModuleKind::SwiftMacro {
                continue;
            }
            let covered = planned_products.values().any(|p| {
                p.kind() == ProductKind::Macro && p.modules().iter().any(|m| m == name)
            });
            if !covered {
                macro_products.push(ResolvedProduct::new(
                    name,
                    ProductKind::Macro,
                    module.package().clone(),
                    vec![name.clone()],
                ));
            }
        }
        for product in macro_products {
            let key = product_key(&product, Destination::Host);
            graph.insert_derived_product(product)?;
            let inserted = graph
                .product(&PackageIdentity::new(&key.0), &key.1)
                .expect("just inserted")
                .clone();
            planned_products.insert(key, inserted);
        }
        debug!(
            "planning {} module and {} product descriptions",
            planned_modules.len(),
            planned_products.len()
        );

        let cx = PlanContext {
            graph: &graph,
            toolchain,
            target_parameters: &target_parameters,
            host_parameters: &host_parameters,
            target_layout,
            host_layout,
            fs,
        };

        // Step 2: module descriptions, in traversal order.
        let mut module_descriptions: IndexMap<(String, Destination), ModuleBuildDescription> =
            IndexMap::new();
        for ((name, destination), module) in &planned_modules {
            let description = match module.kind() {
                ModuleKind::SwiftLibrary
                | ModuleKind::SwiftExecutable
                | ModuleKind::SwiftTest
                | ModuleKind::SwiftSnippet
                | ModuleKind::SwiftMacro => ModuleBuildDescription::Swift(
                    SwiftModuleBuildDescription::new(&cx, module.clone(), *destination, &mut diagnostics)?,
                ),
                ModuleKind::ClangLibrary => ModuleBuildDescription::Clang(
                    ClangModuleBuildDescription::new(&cx, module.clone(), *destination)?,
                ),
                ModuleKind::SystemLibrary { .. } => ModuleBuildDescription::System(
                    SystemModuleBuildDescription::new(module.clone(), *destination, &mut diagnostics)?,
                ),
                ModuleKind::BinaryArtifact { path } => {
                    let path = path.clone();
                    ModuleBuildDescription::Binary(BinaryModuleBuildDescription::new(
                        &cx,
                        module.clone(),
                        *destination,
                        &path,
                    )?)
                }
                ModuleKind::Plugin => ModuleBuildDescription::Plugin(
                    PluginModuleBuildDescription::new(&cx, module.clone())?,
                ),
            };
            module_descriptions.insert((name.clone(), *destination), description);
        }

        // User-provided compiler flags are opaque: a module planned for
        // both destinations gets them verbatim twice, even if they look
        // triple-specific.
        for ((name, destination), _) in &planned_modules {
            if *destination == Destination::Host
                && planned_modules.contains_key(&(name.clone(), Destination::Target))
                && !(target_parameters.flags.cc.is_empty()
                    && target_parameters.flags.swift.is_empty())
            {
                diagnostics.warn(format!(
                    "module '{name}' is planned for both destinations; user compiler flags \
                     are applied unchanged to each"
                ));
            }
        }

        // Step 3: product descriptions.
        let mut product_descriptions: IndexMap<(String, String, Destination), ProductBuildDescription> =
            IndexMap::new();
        for (key, product) in &planned_products {
            let description =
                ProductBuildDescription::new(&cx, product.clone(), key.2, &module_descriptions)?;
            product_descriptions.insert(key.clone(), description);
        }

        // Step 4 happened before description building (the synthesized
        // artifacts must resolve like ordinary graph nodes); step 5:
        validate::validate(&cx, &module_descriptions)?;

        drop(cx);
        Ok(BuildPlan {
            graph,
            target_parameters,
            host_parameters,
            module_descriptions,
            product_descriptions,
            diagnostics,
        })
    }

    pub fn graph(&self) -> &PackageGraph {
        &self.graph
    }

    pub fn target_parameters(&self) -> &BuildParameters {
        &self.target_parameters
    }

    pub fn host_parameters(&self) -> &BuildParameters {
        &self.host_parameters
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn module_descriptions(
        &self,
    ) -> impl Iterator<Item = (&(String, Destination), &ModuleBuildDescription)> {
        self.module_descriptions.iter()
    }

    pub fn product_descriptions(
        &self,
    ) -> impl Iterator<Item = &ProductBuildDescription> {
        self.product_descriptions.values()
    }

    pub fn module_description(
        &self,
        module: &str,
        destination: Destination,
    ) -> Option<&ModuleBuildDescription> {
        self.module_descriptions
            .get(&(module.to_string(), destination))
    }

    pub fn product_description(
        &self,
        package: &PackageIdentity,
        product: &str,
        destination: Destination,
    ) -> Option<&ProductBuildDescription> {
        self.product_descriptions.get(&(
            package.as_str().to_string(),
            product.to_string(),
            destination,
        ))
    }

    /// The compile command line for a planned module.
    pub fn compile_arguments(
        &self,
        module: &str,
        destination: Destination,
    ) -> PlanResult<Vec<String>> {
        let description = self
            .module_description(module, destination)
            .ok_or_else(|| anyhow::format_err!("module '{module}' is not in the plan"))?;
        Ok(description.compile_arguments())
    }

    /// The link command line for a planned product.
    pub fn link_arguments(
        &self,
        package: &PackageIdentity,
        product: &str,
        destination: Destination,
    ) -> PlanResult<Vec<String>> {
        let description = self
            .product_description(package, product, destination)
            .ok_or_else(|| anyhow::format_err!("product '{product}' is not in the plan"))?;
        Ok(description.link_arguments().to_vec())
    }

    /// The objects linked into a planned product.
    pub fn objects(
        &self,
        package: &PackageIdentity,
        product: &str,
        destination: Destination,
    ) -> PlanResult<Vec<std::path::PathBuf>> {
        let description = self
            .product_description(package, product, destination)
            .ok_or_else(|| anyhow::format_err!("product '{product}' is not in the plan"))?;
        Ok(description.objects().to_vec())
    }

    /// Compile arguments stripped of file-specific pieces, for symbol
    /// graph extraction. Empty for modules that do not compile Swift.
    pub fn symbol_graph_extract_arguments(
        &self,
        module: &str,
        destination: Destination,
    ) -> PlanResult<Vec<String>> {
        let description = self
            .module_description(module, destination)
            .ok_or_else(|| anyhow::format_err!("module '{module}' is not in the plan"))?;
        Ok(match description {
            ModuleBuildDescription::Swift(swift) => {
                swift.symbol_graph_extract_arguments().to_vec()
            }
            _ => Vec::new(),
        })
    }

    /// Flags for launching an interactive session against the built
    /// libraries.
    pub fn create_repl_arguments(&self) -> Vec<String> {
        let layout = Layout::new(
            &self.target_parameters.data_path,
            self.target_parameters.configuration,
        );
        let mut args = vec![
            "repl".to_string(),
            "-I".to_string(),
            layout.modules_dir().display().to_string(),
            "-L".to_string(),
            layout.root().display().to_string(),
        ];
        for description in self.product_descriptions.values() {
            let product = description.product();
            if description.destination() == Destination::Target
                && (product.is_dynamic_library() || product.kind() == ProductKind::ReplStub)
            {
                args.push(format!("-l{}", product.name()));
            }
        }
        args
    }
}

fn product_key(product: &ResolvedProduct, destination: Destination) -> (String, String, Destination) {
    (
        product.package().as_str().to_string(),
        product.name().to_string(),
        destination,
    )
}
