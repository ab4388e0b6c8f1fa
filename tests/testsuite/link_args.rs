//! Platform-specific link command assembly.

use std::path::PathBuf;
use swiftplan::core::plan::Destination;
use swiftplan::core::{LibraryLinkage, ModuleDependency, ModuleKind, ProductKind};
use swiftplan_platform::Configuration;
use swiftplan_test_support::{debug_params, params, swift_module, GraphBuilder, PackageBuilder};

use crate::support::{linux_host, macos_host, plan_sources, LINUX, MACOS, WASI};

fn exe_graph() -> swiftplan::PackageGraph {
    let root = PackageBuilder::new("demo");
    let exe = swift_module(&root, "exe", ModuleKind::SwiftExecutable)
        .with_sources(vec![PathBuf::from("/src/main.swift")]);
    GraphBuilder::new()
        .package(root.module(exe).product("exe", ProductKind::Executable, &["exe"]))
        .build()
}

#[test]
fn wasi_static_stdlib_executable() {
    let graph = exe_graph();
    let mut target = debug_params(WASI, Destination::Target);
    target.linking.link_static_swift_stdlib = true;
    let plan = plan_sources(
        &graph,
        target,
        linux_host(),
        &[("/src/main.swift", "print(1)\n")],
    )
    .unwrap();

    let description = plan
        .product_description(&"demo".into(), "exe", Destination::Target)
        .unwrap();
    assert_eq!(
        description.binary_path(),
        &PathBuf::from("/build/debug/exe.wasm")
    );
    let args = description.link_arguments();
    assert!(args.contains(&"-static-stdlib".to_string()));
    assert!(args.contains(&"-emit-executable".to_string()));
    let target_at = args.iter().position(|a| a == "-target").unwrap();
    assert_eq!(args[target_at + 1], "wasm32-unknown-wasi");
    assert!(!args.iter().any(|a| a.contains("rpath")), "{args:?}");
}

#[test]
fn darwin_dynamic_library_gets_install_name_and_rpaths() {
    let root = PackageBuilder::new("demo");
    let core = swift_module(&root, "Core", ModuleKind::SwiftLibrary)
        .with_sources(vec![PathBuf::from("/src/core.swift")]);
    let graph = GraphBuilder::new()
        .package(root.module(core).product(
            "Core",
            ProductKind::Library(LibraryLinkage::Dynamic),
            &["Core"],
        ))
        .build();

    let plan = plan_sources(
        &graph,
        debug_params(MACOS, Destination::Target),
        macos_host(),
        &[],
    )
    .unwrap();

    let description = plan
        .product_description(&"demo".into(), "Core", Destination::Target)
        .unwrap();
    let args = description.link_arguments();
    assert!(args.contains(&"-emit-library".to_string()));
    let install_at = args.iter().position(|a| a == "-install_name").unwrap();
    assert_eq!(args[install_at + 2], "@rpath/libCore.dylib");
    assert!(args.contains(&"@loader_path".to_string()));
    // The toolchain runtime rpath rides along unless the stdlib is
    // linked statically.
    assert!(args
        .iter()
        .any(|a| a == "/toolchain/usr/lib/swift/macosx"));
    // Symbol navigation for the debugger.
    assert!(args.contains(&"-add_ast_path".to_string()));
}

#[test]
fn dead_strip_only_in_release_without_sanitizers() {
    let graph = exe_graph();
    let plan = plan_sources(
        &graph,
        params(LINUX, Configuration::Release, Destination::Target),
        params(LINUX, Configuration::Release, Destination::Host),
        &[("/src/main.swift", "print(1)\n")],
    )
    .unwrap();
    let args = plan
        .link_arguments(&"demo".into(), "exe", Destination::Target)
        .unwrap();
    assert!(args.contains(&"--gc-sections".to_string()));

    let mut sanitized = params(LINUX, Configuration::Release, Destination::Target);
    sanitized.sanitizers = vec![swiftplan::core::plan::Sanitizer::Address];
    let plan = plan_sources(
        &graph,
        sanitized,
        params(LINUX, Configuration::Release, Destination::Host),
        &[("/src/main.swift", "print(1)\n")],
    )
    .unwrap();
    let args = plan
        .link_arguments(&"demo".into(), "exe", Destination::Target)
        .unwrap();
    assert!(!args.contains(&"--gc-sections".to_string()));
    assert!(args.contains(&"-sanitize=address".to_string()));
}

#[test]
fn static_library_uses_the_librarian() {
    let root = PackageBuilder::new("demo");
    let core = swift_module(&root, "Core", ModuleKind::SwiftLibrary)
        .with_sources(vec![PathBuf::from("/src/core.swift")]);
    let graph = GraphBuilder::new()
        .package(root.module(core).product(
            "Core",
            ProductKind::Library(LibraryLinkage::Static),
            &["Core"],
        ))
        .build();

    let plan = plan_sources(
        &graph,
        debug_params(LINUX, Destination::Target),
        linux_host(),
        &[],
    )
    .unwrap();
    let description = plan
        .product_description(&"demo".into(), "Core", Destination::Target)
        .unwrap();
    let invocation = description.invocation();
    assert_eq!(invocation.program, PathBuf::from("/toolchain/usr/bin/llvm-ar"));
    assert_eq!(invocation.args[0], "crs");
    assert_eq!(invocation.args[1], "/build/debug/libCore.a");
    assert!(invocation.args[2].starts_with('@'));
}

#[test]
fn dylib_dependencies_are_linked_not_inlined() {
    let root = PackageBuilder::new("demo");
    let dep = PackageBuilder::new("dep").remote();
    let inner = swift_module(&dep, "Inner", ModuleKind::SwiftLibrary)
        .with_sources(vec![PathBuf::from("/src/dep/inner.swift")]);
    let app = swift_module(&root, "app", ModuleKind::SwiftExecutable)
        .with_sources(vec![PathBuf::from("/src/main.swift")])
        .with_dependencies(vec![ModuleDependency::product("dep", "Inner")]);
    let graph = GraphBuilder::new()
        .package(root.module(app).product("app", ProductKind::Executable, &["app"]))
        .package(dep.module(inner).product(
            "Inner",
            ProductKind::Library(LibraryLinkage::Dynamic),
            &["Inner"],
        ))
        .build();

    let plan = plan_sources(
        &graph,
        debug_params(LINUX, Destination::Target),
        linux_host(),
        &[("/src/main.swift", "print(1)\n")],
    )
    .unwrap();
    let args = plan
        .link_arguments(&"demo".into(), "app", Destination::Target)
        .unwrap();
    assert!(args.contains(&"-lInner".to_string()));
}
