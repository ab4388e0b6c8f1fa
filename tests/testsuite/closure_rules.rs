//! Condition filtering, dynamic-library truncation, and cycle rejection.

use std::path::PathBuf;
use swiftplan::core::plan::Destination;
use swiftplan::core::{LibraryLinkage, ModuleDependency, ModuleKind, ProductKind};
use swiftplan::PlanError;
use swiftplan_platform::{BuildCondition, Configuration, Platform};
use swiftplan_test_support::{params, swift_module, GraphBuilder, PackageBuilder};

use crate::support::{linux_host, macos_host, plan_sources, LINUX, MACOS};

/// `exe` needs `PkgLib` only on Linux or Android; `PkgLib` needs the
/// external `ExtLib` product only in debug builds.
fn conditional_graph() -> swiftplan::PackageGraph {
    let root = PackageBuilder::new("root");
    let ext = PackageBuilder::new("ext").remote();

    let ext_lib = swift_module(&ext, "ExtLibCore", ModuleKind::SwiftLibrary)
        .with_sources(vec![PathBuf::from("/src/ext/core.swift")]);
    let pkg_lib = swift_module(&root, "PkgLib", ModuleKind::SwiftLibrary)
        .with_sources(vec![PathBuf::from("/src/pkglib/lib.swift")])
        .with_dependencies(vec![ModuleDependency::product("ext", "ExtLib")
            .when(BuildCondition::when_configuration(Configuration::Debug))]);
    let exe = swift_module(&root, "exe", ModuleKind::SwiftExecutable)
        .with_sources(vec![PathBuf::from("/src/exe/main.swift")])
        .with_dependencies(vec![ModuleDependency::module("PkgLib").when(
            BuildCondition::when_platforms(vec![Platform::Linux, Platform::Android]),
        )]);

    GraphBuilder::new()
        .package(
            root.module(pkg_lib)
                .module(exe)
                .product("exe", ProductKind::Executable, &["exe"]),
        )
        .package(ext.module(ext_lib).product(
            "ExtLib",
            ProductKind::Library(LibraryLinkage::Static),
            &["ExtLibCore"],
        ))
        .build()
}

#[test]
fn platform_condition_keeps_lib_but_config_drops_external() {
    let graph = conditional_graph();
    let plan = plan_sources(
        &graph,
        params(LINUX, Configuration::Release, Destination::Target),
        params(LINUX, Configuration::Release, Destination::Host),
        &[("/src/exe/main.swift", "print(1)\n")],
    )
    .unwrap();

    let objects = plan
        .objects(&"root".into(), "exe", Destination::Target)
        .unwrap();
    assert!(objects.contains(&PathBuf::from("/build/release/PkgLib.build/lib.o")));
    assert!(!objects.iter().any(|o| o.to_string_lossy().contains("ExtLibCore")));
    assert!(plan.module_description("ExtLibCore", Destination::Target).is_none());
}

#[test]
fn unmatched_platform_drops_the_whole_subtree() {
    let graph = conditional_graph();
    let plan = plan_sources(
        &graph,
        params(MACOS, Configuration::Debug, Destination::Target),
        macos_host(),
        &[("/src/exe/main.swift", "print(1)\n")],
    )
    .unwrap();

    let objects = plan
        .objects(&"root".into(), "exe", Destination::Target)
        .unwrap();
    assert!(!objects.iter().any(|o| o.to_string_lossy().contains("PkgLib")));
    assert!(!objects.iter().any(|o| o.to_string_lossy().contains("ExtLibCore")));
    assert!(plan.module_description("PkgLib", Destination::Target).is_none());
}

#[test]
fn dynamic_library_boundary_truncates_objects() {
    let root = PackageBuilder::new("root");
    let dep = PackageBuilder::new("dep").remote();

    let leaf = swift_module(&dep, "Leaf", ModuleKind::SwiftLibrary)
        .with_sources(vec![PathBuf::from("/src/dep/leaf.swift")]);
    let core = swift_module(&dep, "Core", ModuleKind::SwiftLibrary)
        .with_sources(vec![PathBuf::from("/src/dep/core.swift")])
        .with_dependencies(vec![ModuleDependency::module("Leaf")]);
    let app = swift_module(&root, "app", ModuleKind::SwiftExecutable)
        .with_sources(vec![PathBuf::from("/src/app/main.swift")])
        .with_dependencies(vec![ModuleDependency::product("dep", "DynCore")]);

    let graph = GraphBuilder::new()
        .package(root.module(app).product("app", ProductKind::Executable, &["app"]))
        .package(dep.module(core).module(leaf).product(
            "DynCore",
            ProductKind::Library(LibraryLinkage::Dynamic),
            &["Core"],
        ))
        .build();

    let plan = plan_sources(
        &graph,
        params(LINUX, Configuration::Debug, Destination::Target),
        linux_host(),
        &[("/src/app/main.swift", "print(1)\n")],
    )
    .unwrap();

    // The dylib's objects stay behind the boundary; the library itself
    // is named on the link line instead.
    let app_description = plan
        .product_description(&"root".into(), "app", Destination::Target)
        .unwrap();
    assert!(!app_description
        .objects()
        .iter()
        .any(|o| o.to_string_lossy().contains("Core")));
    assert!(app_description
        .link_arguments()
        .contains(&"-lDynCore".to_string()));

    // The dylib product plans too, with its member objects.
    let dylib = plan
        .product_description(&"dep".into(), "DynCore", Destination::Target)
        .unwrap();
    assert!(dylib
        .objects()
        .iter()
        .any(|o| o.to_string_lossy().contains("Core.build")));
    assert!(dylib
        .objects()
        .iter()
        .any(|o| o.to_string_lossy().contains("Leaf.build")));
    assert_eq!(
        dylib.binary_path(),
        &PathBuf::from("/build/debug/libDynCore.so")
    );
}

#[test]
fn module_cycles_are_fatal() {
    let root = PackageBuilder::new("root");
    let a = swift_module(&root, "A", ModuleKind::SwiftLibrary)
        .with_sources(vec![PathBuf::from("/src/a.swift")])
        .with_dependencies(vec![ModuleDependency::module("B")]);
    let b = swift_module(&root, "B", ModuleKind::SwiftLibrary)
        .with_sources(vec![PathBuf::from("/src/b.swift")])
        .with_dependencies(vec![ModuleDependency::module("A")]);
    let graph = GraphBuilder::new()
        .package(root.module(a).module(b).product(
            "Lib",
            ProductKind::Library(LibraryLinkage::Static),
            &["A"],
        ))
        .build();

    let err = plan_sources(
        &graph,
        params(LINUX, Configuration::Debug, Destination::Target),
        linux_host(),
        &[],
    )
    .unwrap_err();
    let plan_error = err.downcast_ref::<PlanError>().expect("typed error");
    assert!(matches!(plan_error, PlanError::CycleDetected { .. }));
    assert!(err.to_string().contains("A -> B -> A") || err.to_string().contains("B -> A -> B"));
}
