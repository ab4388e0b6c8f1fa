//! The resolved package graph the engine plans from.
//!
//! Resolution itself (version selection, manifest loading, source
//! discovery) happens upstream; what arrives here is already complete:
//! every dependency edge names a module or product that exists in the
//! graph. This module only indexes it and answers lookups.

use anyhow::{bail, format_err};
use indexmap::IndexMap;
use std::sync::Arc;
use swiftplan_platform::BuildCondition;

use crate::core::module::ResolvedModule;
use crate::core::package::{Package, PackageIdentity};
use crate::core::product::ResolvedProduct;
use crate::util::errors::PlanResult;

/// What a dependency edge points at.
#[derive(Clone, Debug, PartialEq)]
pub enum DependencyTarget {
    /// A module, by its graph-wide unique name.
    Module(String),
    /// A product of a specific package.
    Product {
        package: PackageIdentity,
        name: String,
    },
}

/// A typed dependency edge with an optional activation condition.
#[derive(Clone, Debug, PartialEq)]
pub struct ModuleDependency {
    pub target: DependencyTarget,
    pub condition: Option<BuildCondition>,
}

impl ModuleDependency {
    pub fn module(name: &str) -> ModuleDependency {
        ModuleDependency {
            target: DependencyTarget::Module(name.to_string()),
            condition: None,
        }
    }

    pub fn product(package: impl Into<PackageIdentity>, name: &str) -> ModuleDependency {
        ModuleDependency {
            target: DependencyTarget::Product {
                package: package.into(),
                name: name.to_string(),
            },
            condition: None,
        }
    }

    pub fn when(mut self, condition: BuildCondition) -> ModuleDependency {
        self.condition = Some(condition);
        self
    }
}

/// The resolved graph: packages, their modules and products, indexed for
/// lookup. Iteration order everywhere is insertion order, which makes
/// plan construction deterministic for identical inputs.
#[derive(Clone, Debug, Default)]
pub struct PackageGraph {
    packages: IndexMap<PackageIdentity, Package>,
    modules: IndexMap<String, Arc<ResolvedModule>>,
    products: IndexMap<(PackageIdentity, String), Arc<ResolvedProduct>>,
}

impl PackageGraph {
    pub fn new(
        packages: Vec<Package>,
        modules: Vec<ResolvedModule>,
        products: Vec<ResolvedProduct>,
    ) -> PlanResult<PackageGraph> {
        let mut graph = PackageGraph::default();
        for package in packages {
            if graph
                .packages
                .insert(package.identity().clone(), package)
                .is_some()
            {
                bail!("duplicate package identity in resolved graph");
            }
        }
        for module in modules {
            let name = module.name().to_string();
            if !graph.packages.contains_key(module.package()) {
                bail!(
                    "module '{}' belongs to unknown package '{}'",
                    name,
                    module.package()
                );
            }
            if graph.modules.insert(name.clone(), Arc::new(module)).is_some() {
                bail!("duplicate module name '{}' in resolved graph", name);
            }
        }
        for product in products {
            let key = (product.package().clone(), product.name().to_string());
            if !graph.packages.contains_key(&key.0) {
                bail!(
                    "product '{}' belongs to unknown package '{}'",
                    key.1,
                    key.0
                );
            }
            graph.products.insert(key, Arc::new(product));
        }
        graph.check_edges()?;
        Ok(graph)
    }

    /// Every edge must point at a module or product present in the graph;
    /// a dangling edge means resolution upstream went wrong.
    fn check_edges(&self) -> PlanResult<()> {
        for module in self.modules.values() {
            for dep in module.dependencies() {
                match &dep.target {
                    DependencyTarget::Module(name) => {
                        if !self.modules.contains_key(name) {
                            bail!(
                                "module '{}' depends on unknown module '{}'",
                                module.name(),
                                name
                            );
                        }
                    }
                    DependencyTarget::Product { package, name } => {
                        if self.product(package, name).is_none() {
                            bail!(
                                "module '{}' depends on unknown product '{}' of package '{}'",
                                module.name(),
                                name,
                                package
                            );
                        }
                    }
                }
            }
        }
        for product in self.products.values() {
            for member in product.modules() {
                if !self.modules.contains_key(member) {
                    bail!(
                        "product '{}' lists unknown module '{}'",
                        product.name(),
                        member
                    );
                }
            }
        }
        Ok(())
    }

    pub fn packages(&self) -> impl Iterator<Item = &Package> {
        self.packages.values()
    }

    pub fn package(&self, identity: &PackageIdentity) -> Option<&Package> {
        self.packages.get(identity)
    }

    pub fn package_of_module(&self, module: &ResolvedModule) -> PlanResult<&Package> {
        self.packages
            .get(module.package())
            .ok_or_else(|| format_err!("unknown package '{}'", module.package()))
    }

    pub fn modules(&self) -> impl Iterator<Item = &Arc<ResolvedModule>> {
        self.modules.values()
    }

    pub fn module(&self, name: &str) -> Option<&Arc<ResolvedModule>> {
        self.modules.get(name)
    }

    pub fn products(&self) -> impl Iterator<Item = &Arc<ResolvedProduct>> {
        self.products.values()
    }

    pub fn product(&self, package: &PackageIdentity, name: &str) -> Option<&Arc<ResolvedProduct>> {
        self.products.get(&(package.clone(), name.to_string()))
    }

    /// Products of root packages, the starting points of plan assembly.
    pub fn root_products(&self) -> Vec<Arc<ResolvedProduct>> {
        self.products
            .values()
            .filter(|p| {
                self.packages
                    .get(p.package())
                    .map_or(false, |pkg| pkg.is_root())
            })
            .cloned()
            .collect()
    }

    /// Insert a module synthesized during plan construction (e.g. test
    /// discovery). The name must not collide with a resolved module.
    pub(crate) fn insert_derived_module(&mut self, module: ResolvedModule) -> PlanResult<()> {
        let name = module.name().to_string();
        if self.modules.insert(name.clone(), Arc::new(module)).is_some() {
            bail!("derived module '{}' collides with a resolved module", name);
        }
        Ok(())
    }

    /// Insert a product synthesized during plan construction (e.g. the
    /// test entry point).
    pub(crate) fn insert_derived_product(&mut self, product: ResolvedProduct) -> PlanResult<()> {
        let key = (product.package().clone(), product.name().to_string());
        if self.products.insert(key, Arc::new(product)).is_some() {
            bail!("derived product collides with a resolved product");
        }
        Ok(())
    }

    /// Test modules grouped by owning root package, for test-product
    /// synthesis. Order follows package then module insertion order.
    pub fn test_modules_by_root_package(&self) -> Vec<(&Package, Vec<Arc<ResolvedModule>>)> {
        let mut out = Vec::new();
        for package in self.packages.values().filter(|p| p.is_root()) {
            let tests: Vec<_> = self
                .modules
                .values()
                .filter(|m| m.package() == package.identity() && m.is_test())
                .cloned()
                .collect();
            if !tests.is_empty() {
                out.push((package, tests));
            }
        }
        out
    }
}
