//! Fixture helpers for the plan testsuite: a builder DSL over the
//! resolved-graph types, canned build parameters, a mock toolchain, and
//! an in-memory filesystem pre-seeded with source files.

use std::path::PathBuf;

use swiftplan::core::plan::{BuildParameters, BuildPlan, Destination, Toolchain};
use swiftplan::core::{
    ModuleKind, Package, PackageGraph, PackageIdentity, PackageOrigin, ProductKind,
    ResolvedModule, ResolvedProduct, SupportedPlatform, ToolsVersion,
};
use swiftplan::util::InMemoryFileSystem;
use swiftplan::PlanResult;
use swiftplan_platform::{Configuration, Platform, Triple};

/// Builds a [`PackageGraph`] package by package.
#[derive(Default)]
pub struct GraphBuilder {
    packages: Vec<Package>,
    modules: Vec<ResolvedModule>,
    products: Vec<ResolvedProduct>,
}

impl GraphBuilder {
    pub fn new() -> GraphBuilder {
        GraphBuilder::default()
    }

    pub fn package(mut self, package: PackageBuilder) -> GraphBuilder {
        let PackageBuilder {
            identity,
            origin,
            tools_version,
            platforms,
            modules,
            products,
        } = package;
        self.packages
            .push(Package::new(identity, origin, tools_version, platforms));
        self.modules.extend(modules);
        self.products.extend(products);
        self
    }

    pub fn build(self) -> PackageGraph {
        PackageGraph::new(self.packages, self.modules, self.products)
            .expect("fixture graph must resolve")
    }
}

/// Builds one package with its modules and products.
pub struct PackageBuilder {
    identity: PackageIdentity,
    origin: PackageOrigin,
    tools_version: ToolsVersion,
    platforms: Vec<SupportedPlatform>,
    modules: Vec<ResolvedModule>,
    products: Vec<ResolvedProduct>,
}

impl PackageBuilder {
    pub fn new(name: &str) -> PackageBuilder {
        PackageBuilder {
            identity: PackageIdentity::new(name),
            origin: PackageOrigin::Root,
            tools_version: ToolsVersion::V5_9,
            platforms: Vec::new(),
            modules: Vec::new(),
            products: Vec::new(),
        }
    }

    pub fn identity(&self) -> PackageIdentity {
        self.identity.clone()
    }

    pub fn local(mut self) -> PackageBuilder {
        self.origin = PackageOrigin::Local;
        self
    }

    pub fn remote(mut self) -> PackageBuilder {
        self.origin = PackageOrigin::Remote;
        self
    }

    pub fn tools_version(mut self, version: ToolsVersion) -> PackageBuilder {
        self.tools_version = version;
        self
    }

    pub fn platform(mut self, platform: Platform, version: &str) -> PackageBuilder {
        self.platforms.push(SupportedPlatform {
            platform,
            version: version.parse().expect("fixture platform version"),
        });
        self
    }

    pub fn module(mut self, module: ResolvedModule) -> PackageBuilder {
        self.modules.push(module);
        self
    }

    pub fn product(mut self, name: &str, kind: ProductKind, modules: &[&str]) -> PackageBuilder {
        self.products.push(ResolvedProduct::new(
            name,
            kind,
            self.identity.clone(),
            modules.iter().map(|m| m.to_string()).collect(),
        ));
        self
    }
}

/// A swift module shell owned by `package`; chain the `with_*` setters
/// for details.
pub fn swift_module(package: &PackageBuilder, name: &str, kind: ModuleKind) -> ResolvedModule {
    ResolvedModule::new(name, kind, package.identity())
}

/// Canned parameters for a destination: data under `/build` (target) or
/// `/build/host`, eight workers.
pub fn params(triple: &str, configuration: Configuration, destination: Destination) -> BuildParameters {
    let triple: Triple = triple.parse().expect("fixture triple");
    let data_path = match destination {
        Destination::Target => PathBuf::from("/build"),
        Destination::Host => PathBuf::from("/build/host"),
    };
    let mut params = BuildParameters::new(data_path, configuration, triple, destination);
    params.workers = 8;
    params
}

pub fn debug_params(triple: &str, destination: Destination) -> BuildParameters {
    params(triple, Configuration::Debug, destination)
}

pub fn release_params(triple: &str, destination: Destination) -> BuildParameters {
    params(triple, Configuration::Release, destination)
}

/// A toolchain rooted at `/toolchain`, supporting every probed flag.
pub fn mock_toolchain() -> Toolchain {
    Toolchain::new(
        "/toolchain/usr/bin/swiftc",
        "/toolchain/usr/bin/clang",
        "/toolchain/usr/bin/llvm-ar",
    )
    .with_resources_path("/toolchain/usr/lib/swift")
}

/// An in-memory filesystem seeded with `(path, contents)` pairs.
pub fn seeded_fs(files: &[(&str, &str)]) -> InMemoryFileSystem {
    let fs = InMemoryFileSystem::new();
    for (path, contents) in files {
        fs.add_file(*path, *contents);
    }
    fs
}

/// Build a plan with canned toolchain and an empty in-memory filesystem.
pub fn plan(
    graph: &PackageGraph,
    target: BuildParameters,
    host: BuildParameters,
) -> PlanResult<BuildPlan> {
    plan_with_fs(graph, target, host, &InMemoryFileSystem::new())
}

pub fn plan_with_fs(
    graph: &PackageGraph,
    target: BuildParameters,
    host: BuildParameters,
    fs: &InMemoryFileSystem,
) -> PlanResult<BuildPlan> {
    BuildPlan::new(graph, target, host, &mock_toolchain(), fs)
}
