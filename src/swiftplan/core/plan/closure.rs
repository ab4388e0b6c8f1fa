//! Transitive-closure computation over the resolved graph.
//!
//! The graph stores dependencies between modules and products; planning
//! needs them lowered to flat, per-destination sets: which modules must a
//! compiler invocation see, and which objects must a link pull in. The
//! two questions differ only in how dynamic-library product boundaries
//! are treated, so both are answered by one traversal parameterized on a
//! [`ClosureKind`].
//!
//! Destination propagation happens here too: reaching a macro or plugin
//! module flips the rest of that subtree to the host destination, and a
//! module reachable both ways is visited once per destination.

use anyhow::format_err;
use std::collections::HashSet;
use std::sync::Arc;
use swiftplan_platform::{condition_satisfied, BuildEnvironment};
use tracing::trace;

use crate::core::graph::{DependencyTarget, PackageGraph};
use crate::core::module::ResolvedModule;
use crate::core::plan::Destination;
use crate::core::product::ResolvedProduct;
use crate::util::errors::{PlanError, PlanResult};

/// Which closure variant to compute.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ClosureKind {
    /// Everything whose interface the root's compiler must see. Dynamic
    /// library products do not truncate: headers and swiftmodules flow
    /// through the boundary.
    Compile,
    /// Everything whose objects are linked into the root. Truncates at
    /// dynamic-library product boundaries; what lies behind them arrives
    /// via the dynamic library itself.
    Link,
}

/// Result of a traversal, in deterministic first-visit order.
#[derive(Debug, Default)]
pub struct Closure {
    pub modules: Vec<(Arc<ResolvedModule>, Destination)>,
    pub products: Vec<(Arc<ResolvedProduct>, Destination)>,
}

impl Closure {
    /// Dynamic-library products encountered, minus the given root.
    pub fn dynamic_library_products(
        &self,
        except: &ResolvedProduct,
    ) -> Vec<(Arc<ResolvedProduct>, Destination)> {
        self.products
            .iter()
            .filter(|(p, _)| {
                p.is_dynamic_library()
                    && !(p.name() == except.name() && p.package() == except.package())
            })
            .cloned()
            .collect()
    }
}

pub struct ClosureResolver<'a> {
    graph: &'a PackageGraph,
    target_env: BuildEnvironment,
    host_env: BuildEnvironment,
}

#[derive(Default)]
struct Traversal {
    closure: Closure,
    visited: HashSet<(String, Destination)>,
    products_seen: HashSet<(String, String, Destination)>,
    stack: Vec<(String, Destination)>,
}

impl<'a> ClosureResolver<'a> {
    pub fn new(
        graph: &'a PackageGraph,
        target_env: BuildEnvironment,
        host_env: BuildEnvironment,
    ) -> ClosureResolver<'a> {
        ClosureResolver {
            graph,
            target_env,
            host_env,
        }
    }

    fn environment(&self, destination: Destination) -> &BuildEnvironment {
        match destination {
            Destination::Target => &self.target_env,
            Destination::Host => &self.host_env,
        }
    }

    /// The dependencies of `root`, excluding `root` itself.
    pub fn module_closure(
        &self,
        root: &Arc<ResolvedModule>,
        destination: Destination,
        kind: ClosureKind,
    ) -> PlanResult<Closure> {
        let mut traversal = Traversal::default();
        traversal
            .stack
            .push((root.name().to_string(), destination));
        traversal
            .visited
            .insert((root.name().to_string(), destination));
        self.visit_dependencies(root, destination, kind, &mut traversal)?;
        Ok(traversal.closure)
    }

    /// The member modules of `root` and everything reachable from them.
    pub fn product_closure(
        &self,
        root: &ResolvedProduct,
        destination: Destination,
        kind: ClosureKind,
    ) -> PlanResult<Closure> {
        let mut traversal = Traversal::default();
        for member in root.modules() {
            let module = self.lookup_module(member)?;
            self.visit_module(&module, destination, kind, &mut traversal)?;
        }
        Ok(traversal.closure)
    }

    fn lookup_module(&self, name: &str) -> PlanResult<Arc<ResolvedModule>> {
        self.graph
            .module(name)
            .cloned()
            .ok_or_else(|| format_err!("module '{}' missing from resolved graph", name))
    }

    fn visit_module(
        &self,
        module: &Arc<ResolvedModule>,
        destination: Destination,
        kind: ClosureKind,
        traversal: &mut Traversal,
    ) -> PlanResult<()> {
        let destination = if module.builds_for_host() {
            Destination::Host
        } else {
            destination
        };
        let key = (module.name().to_string(), destination);
        if traversal.stack.contains(&key) {
            let mut path: Vec<String> =
                traversal.stack.iter().map(|(name, _)| name.clone()).collect();
            path.push(module.name().to_string());
            return Err(PlanError::CycleDetected { path }.into());
        }
        if !traversal.visited.insert(key.clone()) {
            return Ok(());
        }
        trace!("visiting {} ({:?})", module.name(), destination);
        traversal
            .closure
            .modules
            .push((module.clone(), destination));
        traversal.stack.push(key);
        self.visit_dependencies(module, destination, kind, traversal)?;
        traversal.stack.pop();
        Ok(())
    }

    fn visit_dependencies(
        &self,
        module: &ResolvedModule,
        destination: Destination,
        kind: ClosureKind,
        traversal: &mut Traversal,
    ) -> PlanResult<()> {
        let environment = *self.environment(destination);
        for dependency in module.dependencies() {
            if !condition_satisfied(dependency.condition.as_ref(), &environment) {
                trace!(
                    "skipping dependency of {} for {:?}: condition not met",
                    module.name(),
                    destination
                );
                continue;
            }
            match &dependency.target {
                DependencyTarget::Module(name) => {
                    let child = self.lookup_module(name)?;
                    self.visit_module(&child, destination, kind, traversal)?;
                }
                DependencyTarget::Product { package, name } => {
                    let product = self
                        .graph
                        .product(package, name)
                        .cloned()
                        .ok_or_else(|| {
                            format_err!("product '{}' missing from resolved graph", name)
                        })?;
                    let product_key = (
                        package.as_str().to_string(),
                        name.to_string(),
                        destination,
                    );
                    if traversal.products_seen.insert(product_key) {
                        traversal
                            .closure
                            .products
                            .push((product.clone(), destination));
                    }
                    if kind == ClosureKind::Link && product.truncates_link_closure() {
                        continue;
                    }
                    for member in product.modules() {
                        let child = self.lookup_module(member)?;
                        self.visit_module(&child, destination, kind, traversal)?;
                    }
                }
            }
        }
        Ok(())
    }
}
