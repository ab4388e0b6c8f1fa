//! A plain executable-plus-library package on Linux, debug.

use std::path::PathBuf;
use swiftplan::core::plan::Destination;
use swiftplan::core::{ModuleKind, ProductKind};
use swiftplan_test_support::{debug_params, swift_module, GraphBuilder, PackageBuilder};

use crate::support::{linux_host, plan_sources, LINUX};

fn graph() -> swiftplan::PackageGraph {
    let root = PackageBuilder::new("demo");
    let lib = swift_module(&root, "lib", ModuleKind::SwiftLibrary)
        .with_sources(vec![PathBuf::from("/src/lib/a.swift"), PathBuf::from("/src/lib/b.swift")]);
    let exe = swift_module(&root, "exe", ModuleKind::SwiftExecutable)
        .with_sources(vec![PathBuf::from("/src/exe/main.swift")])
        .with_dependencies(vec![swiftplan::core::ModuleDependency::module("lib")]);
    GraphBuilder::new()
        .package(
            root.module(lib)
                .module(exe)
                .product("exe", ProductKind::Executable, &["exe"]),
        )
        .build()
}

#[test]
fn plans_two_modules_and_one_product() {
    let graph = graph();
    let plan = plan_sources(
        &graph,
        debug_params(LINUX, Destination::Target),
        linux_host(),
        &[("/src/exe/main.swift", "print(\"hi\")\n")],
    )
    .unwrap();

    assert_eq!(plan.module_descriptions().count(), 2);
    assert_eq!(plan.product_descriptions().count(), 1);
    assert!(plan.module_description("exe", Destination::Target).is_some());
    assert!(plan.module_description("lib", Destination::Target).is_some());
    assert!(plan.module_description("exe", Destination::Host).is_none());
}

#[test]
fn debug_compile_arguments() {
    let graph = graph();
    let plan = plan_sources(
        &graph,
        debug_params(LINUX, Destination::Target),
        linux_host(),
        &[("/src/exe/main.swift", "print(\"hi\")\n")],
    )
    .unwrap();

    let args = plan.compile_arguments("exe", Destination::Target).unwrap();
    for expected in [
        "-enable-batch-mode",
        "-Onone",
        "-enable-testing",
        "-serialize-diagnostics",
        "-DSWIFT_PACKAGE",
        "-DDEBUG",
        "-g",
        "-j8",
    ] {
        assert!(args.contains(&expected.to_string()), "missing {expected} in {args:?}");
    }
    let version_at = args.iter().position(|a| a == "-swift-version").unwrap();
    assert_eq!(args[version_at + 1], "5");
    assert!(args.contains(&"-module-name".to_string()));
    // A main.swift with top-level code keeps the script model.
    assert!(!args.contains(&"-parse-as-library".to_string()));
    // Linux keeps frame pointers by default.
    assert!(args.contains(&"-fno-omit-frame-pointer".to_string()));
}

#[test]
fn executable_link_arguments() {
    let graph = graph();
    let plan = plan_sources(
        &graph,
        debug_params(LINUX, Destination::Target),
        linux_host(),
        &[("/src/exe/main.swift", "print(\"hi\")\n")],
    )
    .unwrap();

    let identity = swiftplan::core::PackageIdentity::new("demo");
    let description = plan
        .product_description(&identity, "exe", Destination::Target)
        .unwrap();
    assert_eq!(description.binary_path(), &PathBuf::from("/build/debug/exe"));

    let args = description.link_arguments();
    assert!(args.contains(&"-emit-executable".to_string()));
    assert!(args.contains(&"-rpath=$ORIGIN".to_string()));
    let target_at = args.iter().position(|a| a == "-target").unwrap();
    assert_eq!(args[target_at + 1], "x86_64-unknown-linux-gnu");

    // Objects are the full closure: exe's one source, lib's two, plus
    // the wrapped swiftmodules on a non-Darwin target.
    let objects = description.objects();
    assert!(objects.contains(&PathBuf::from("/build/debug/exe.build/main.o")));
    assert!(objects.contains(&PathBuf::from("/build/debug/lib.build/a.o")));
    assert!(objects.contains(&PathBuf::from("/build/debug/lib.build/b.o")));
    assert!(objects.contains(&PathBuf::from("/build/debug/lib.build/lib.swiftmodule.o")));
}
