pub use self::graph::{DependencyTarget, ModuleDependency, PackageGraph};
pub use self::module::{
    BuildSettings, ClangSetting, Conditional, DefaultIsolation, InteropMode, ModuleKind,
    ModuleMapType, PkgConfigPaths, ResolvedModule, SwiftSetting, SystemPackageProvider,
};
pub use self::package::{Package, PackageIdentity, PackageOrigin, SupportedPlatform, ToolsVersion};
pub use self::product::{LibraryLinkage, LinkerSetting, ProductKind, ResolvedProduct};

pub mod graph;
pub mod module;
pub mod package;
pub mod plan;
pub mod product;
