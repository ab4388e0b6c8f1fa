//! C-family compile command assembly and module-map synthesis.

use std::path::PathBuf;
use swiftplan::core::plan::Destination;
use swiftplan::core::{ModuleDependency, ModuleKind, ProductKind};
use swiftplan_test_support::{debug_params, seeded_fs, swift_module, GraphBuilder, PackageBuilder};

use crate::support::{linux_host, plan_sources, LINUX, MACOS, WINDOWS};

fn clang_graph(headers: bool) -> swiftplan::PackageGraph {
    let root = PackageBuilder::new("demo");
    let mut lib = swift_module(&root, "clib", ModuleKind::ClangLibrary)
        .with_sources(vec![PathBuf::from("/src/clib/impl.c")]);
    if headers {
        lib = lib.with_public_headers_dir("/src/clib/include");
    }
    GraphBuilder::new()
        .package(root.module(lib).product(
            "clib",
            ProductKind::Library(swiftplan::core::LibraryLinkage::Static),
            &["clib"],
        ))
        .build()
}

#[test]
fn windows_clang_module() {
    let graph = clang_graph(false);
    let plan = plan_sources(
        &graph,
        debug_params(WINDOWS, Destination::Target),
        linux_host(),
        &[],
    )
    .unwrap();

    let args = plan.compile_arguments("clib", Destination::Target).unwrap();
    assert!(args.contains(&"-gdwarf".to_string()));
    assert!(!args.contains(&"-g".to_string()));
    assert!(!args.contains(&"-fobjc-arc".to_string()));
    for expected in ["-DSWIFT_PACKAGE=1", "-DDEBUG=1", "-fblocks", "-O0"] {
        assert!(args.contains(&expected.to_string()), "missing {expected}");
    }
}

#[test]
fn windows_executable_links_with_lld_and_dwarf() {
    let root = PackageBuilder::new("demo");
    let lib = swift_module(&root, "clib", ModuleKind::ClangLibrary)
        .with_sources(vec![PathBuf::from("/src/clib/impl.c")]);
    let exe = swift_module(&root, "exe", ModuleKind::SwiftExecutable)
        .with_sources(vec![PathBuf::from("/src/main.swift")])
        .with_dependencies(vec![ModuleDependency::module("clib")]);
    let graph = GraphBuilder::new()
        .package(
            root.module(lib)
                .module(exe)
                .product("exe", ProductKind::Executable, &["exe"]),
        )
        .build();

    let plan = plan_sources(
        &graph,
        debug_params(WINDOWS, Destination::Target),
        linux_host(),
        &[("/src/main.swift", "print(1)\n")],
    )
    .unwrap();
    let description = plan
        .product_description(&"demo".into(), "exe", Destination::Target)
        .unwrap();
    assert_eq!(
        description.binary_path(),
        &PathBuf::from("/build/debug/exe.exe")
    );
    let args = description.link_arguments();
    assert!(args.contains(&"-use-ld=lld".to_string()));
    assert!(args.contains(&"-debug:dwarf".to_string()));
    assert!(!args.iter().any(|a| a.contains("rpath")));
}

#[test]
fn darwin_enables_arc_and_modules() {
    let graph = clang_graph(true);
    let plan = plan_sources(
        &graph,
        debug_params(MACOS, Destination::Target),
        linux_host(),
        &[],
    )
    .unwrap();
    let args = plan.compile_arguments("clib", Destination::Target).unwrap();
    assert!(args.contains(&"-fobjc-arc".to_string()));
    assert!(args.contains(&"-fmodules".to_string()));
    assert!(args.contains(&"-fmodule-name=clib".to_string()));
    assert!(args.contains(&"-g".to_string()));
}

#[test]
fn module_map_is_synthesized_over_public_headers() {
    let graph = clang_graph(true);
    let fs = seeded_fs(&[]);
    let plan = swiftplan_test_support::plan_with_fs(
        &graph,
        debug_params(LINUX, Destination::Target),
        linux_host(),
        &fs,
    )
    .unwrap();

    let map_path = PathBuf::from("/build/debug/clib.build/module.modulemap");
    let contents = fs.contents(&map_path).expect("synthesized module map");
    assert!(contents.contains("module clib {"));
    assert!(contents.contains("umbrella \"/src/clib/include\""));
    assert!(contents.contains("export *"));

    let description = plan
        .module_description("clib", Destination::Target)
        .unwrap();
    assert_eq!(description.module_map(), Some(map_path));
}

#[test]
fn umbrella_header_is_preferred_when_named_after_the_module() {
    let graph = clang_graph(true);
    let fs = seeded_fs(&[("/src/clib/include/clib.h", "// umbrella\n")]);
    swiftplan_test_support::plan_with_fs(
        &graph,
        debug_params(LINUX, Destination::Target),
        linux_host(),
        &fs,
    )
    .unwrap();
    let contents = fs
        .contents(&PathBuf::from("/build/debug/clib.build/module.modulemap"))
        .unwrap();
    assert!(contents.contains("umbrella header \"/src/clib/include/clib.h\""));
}

#[test]
fn remote_packages_compile_quietly() {
    let root = PackageBuilder::new("root");
    let dep = PackageBuilder::new("dep").remote();
    let vendored = swift_module(&dep, "vendored", ModuleKind::ClangLibrary)
        .with_sources(vec![PathBuf::from("/src/dep/v.c")]);
    let app = swift_module(&root, "app", ModuleKind::SwiftExecutable)
        .with_sources(vec![PathBuf::from("/src/main.swift")])
        .with_dependencies(vec![ModuleDependency::module("vendored")]);
    let graph = GraphBuilder::new()
        .package(root.module(app).product("app", ProductKind::Executable, &["app"]))
        .package(dep.module(vendored))
        .build();

    let plan = plan_sources(
        &graph,
        debug_params(LINUX, Destination::Target),
        linux_host(),
        &[("/src/main.swift", "print(1)\n")],
    )
    .unwrap();
    let dep_args = plan
        .compile_arguments("vendored", Destination::Target)
        .unwrap();
    assert!(dep_args.contains(&"-w".to_string()));
    let root_args = plan.compile_arguments("app", Destination::Target).unwrap();
    assert!(!root_args.contains(&"-w".to_string()));
}

#[test]
fn swift_consumer_imports_the_dependency_module_map() {
    let root = PackageBuilder::new("demo");
    let lib = swift_module(&root, "clib", ModuleKind::ClangLibrary)
        .with_sources(vec![PathBuf::from("/src/clib/impl.c")])
        .with_public_headers_dir("/src/clib/include");
    let app = swift_module(&root, "app", ModuleKind::SwiftExecutable)
        .with_sources(vec![PathBuf::from("/src/main.swift")])
        .with_dependencies(vec![ModuleDependency::module("clib")]);
    let graph = GraphBuilder::new()
        .package(
            root.module(lib)
                .module(app)
                .product("app", ProductKind::Executable, &["app"]),
        )
        .build();

    let plan = plan_sources(
        &graph,
        debug_params(LINUX, Destination::Target),
        linux_host(),
        &[("/src/main.swift", "print(1)\n")],
    )
    .unwrap();
    let args = plan.compile_arguments("app", Destination::Target).unwrap();
    assert!(args
        .contains(&"-fmodule-map-file=/build/debug/clib.build/module.modulemap".to_string()));
    let header_at = args
        .iter()
        .position(|a| a == "/src/clib/include")
        .expect("header dir");
    assert_eq!(args[header_at - 1], "-Xcc");
}
