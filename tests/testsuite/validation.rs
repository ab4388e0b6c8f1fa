//! Platform-version compatibility, buildability, and tools-version
//! gating.

use std::path::PathBuf;
use swiftplan::core::module::{BuildSettings, Conditional, SwiftSetting};
use swiftplan::core::plan::Destination;
use swiftplan::core::{
    LibraryLinkage, ModuleDependency, ModuleKind, ModuleMapType, ProductKind, ToolsVersion,
};
use swiftplan::PlanError;
use swiftplan_platform::Platform;
use swiftplan_test_support::{debug_params, swift_module, GraphBuilder, PackageBuilder};

use crate::support::{linux_host, macos_host, plan_sources, LINUX, MACOS};

/// Consumer declares macOS 10.13, producer requires 10.15.
fn version_skew_graph() -> swiftplan::PackageGraph {
    let root = PackageBuilder::new("root").platform(Platform::MacOS, "10.13");
    let dep = PackageBuilder::new("dep")
        .remote()
        .platform(Platform::MacOS, "10.15");
    let lib = swift_module(&dep, "Lib", ModuleKind::SwiftLibrary)
        .with_sources(vec![PathBuf::from("/src/dep/lib.swift")]);
    let app = swift_module(&root, "app", ModuleKind::SwiftExecutable)
        .with_sources(vec![PathBuf::from("/src/main.swift")])
        .with_dependencies(vec![ModuleDependency::product("dep", "Lib")]);
    GraphBuilder::new()
        .package(root.module(app).product("app", ProductKind::Executable, &["app"]))
        .package(dep.module(lib).product(
            "Lib",
            ProductKind::Library(LibraryLinkage::Static),
            &["Lib"],
        ))
        .build()
}

#[test]
fn platform_version_skew_is_fatal_on_that_platform() {
    let graph = version_skew_graph();
    let err = plan_sources(
        &graph,
        debug_params(MACOS, Destination::Target),
        macos_host(),
        &[("/src/main.swift", "print(1)\n")],
    )
    .unwrap_err();
    let plan_error = err.downcast_ref::<PlanError>().expect("typed error");
    assert!(matches!(plan_error, PlanError::PlatformVersionIncompatible { .. }));
    let message = err.to_string();
    assert!(message.contains("app"), "{message}");
    assert!(message.contains("Lib"), "{message}");
    assert!(message.contains("10.13") && message.contains("10.15"), "{message}");
    assert!(message.contains("raise") && message.contains("lower"), "{message}");
}

#[test]
fn platform_version_skew_is_ignored_on_other_platforms() {
    let graph = version_skew_graph();
    plan_sources(
        &graph,
        debug_params(LINUX, Destination::Target),
        linux_host(),
        &[("/src/main.swift", "print(1)\n")],
    )
    .unwrap();
}

#[test]
fn a_plan_with_nothing_to_compile_is_an_error() {
    let root = PackageBuilder::new("root");
    let syslib = swift_module(
        &root,
        "CSqlite",
        ModuleKind::SystemLibrary {
            pkg_config_name: Some("sqlite3".to_string()),
            pkg_config: None,
            providers: vec![],
        },
    )
    .with_module_map(ModuleMapType::Custom(PathBuf::from("/src/sqlite/module.modulemap")));
    let graph = GraphBuilder::new()
        .package(root.module(syslib).product(
            "CSqlite",
            ProductKind::Library(LibraryLinkage::Automatic),
            &["CSqlite"],
        ))
        .build();

    let err = plan_sources(
        &graph,
        debug_params(LINUX, Destination::Target),
        linux_host(),
        &[],
    )
    .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<PlanError>(),
        Some(PlanError::NoBuildableModule)
    ));
}

#[test]
fn safety_settings_require_a_modern_tools_version() {
    let settings = BuildSettings {
        swift: vec![Conditional::always(SwiftSetting::StrictMemorySafety)],
        ..BuildSettings::default()
    };

    let old = PackageBuilder::new("old").tools_version(ToolsVersion::new(5, 8));
    let exe = swift_module(&old, "app", ModuleKind::SwiftExecutable)
        .with_sources(vec![PathBuf::from("/src/main.swift")])
        .with_settings(settings.clone());
    let graph = GraphBuilder::new()
        .package(old.module(exe).product("app", ProductKind::Executable, &["app"]))
        .build();
    let plan = plan_sources(
        &graph,
        debug_params(LINUX, Destination::Target),
        linux_host(),
        &[("/src/main.swift", "print(1)\n")],
    )
    .unwrap();
    let args = plan.compile_arguments("app", Destination::Target).unwrap();
    assert!(!args.contains(&"-strict-memory-safety".to_string()));
    assert!(plan
        .diagnostics()
        .warnings()
        .iter()
        .any(|w| w.contains("strict memory safety") && w.contains("5.8")));

    let modern = PackageBuilder::new("modern").tools_version(ToolsVersion::V6);
    let exe = swift_module(&modern, "app", ModuleKind::SwiftExecutable)
        .with_sources(vec![PathBuf::from("/src/main.swift")])
        .with_settings(settings);
    let graph = GraphBuilder::new()
        .package(modern.module(exe).product("app", ProductKind::Executable, &["app"]))
        .build();
    let plan = plan_sources(
        &graph,
        debug_params(LINUX, Destination::Target),
        linux_host(),
        &[("/src/main.swift", "print(1)\n")],
    )
    .unwrap();
    let args = plan.compile_arguments("app", Destination::Target).unwrap();
    assert!(args.contains(&"-strict-memory-safety".to_string()));
    assert!(plan.diagnostics().is_empty());
}

#[test]
fn package_naming_follows_the_tools_version() {
    for (tools, expected) in [(ToolsVersion::new(5, 8), false), (ToolsVersion::V5_9, true)] {
        let pkg = PackageBuilder::new("demo").tools_version(tools);
        let exe = swift_module(&pkg, "app", ModuleKind::SwiftExecutable)
            .with_sources(vec![PathBuf::from("/src/main.swift")]);
        let graph = GraphBuilder::new()
            .package(pkg.module(exe).product("app", ProductKind::Executable, &["app"]))
            .build();
        let plan = plan_sources(
            &graph,
            debug_params(LINUX, Destination::Target),
            linux_host(),
            &[("/src/main.swift", "print(1)\n")],
        )
        .unwrap();
        let args = plan.compile_arguments("app", Destination::Target).unwrap();
        assert_eq!(args.contains(&"-package-name".to_string()), expected);
        // Dropping the flag on an old tools version is warned about.
        let warned = plan
            .diagnostics()
            .warnings()
            .iter()
            .any(|w| w.contains("namespacing") && w.contains("5.8"));
        assert_eq!(warned, !expected);
    }
}

#[test]
fn missing_pkg_config_is_a_warning_with_hints() {
    let root = PackageBuilder::new("root");
    let syslib = swift_module(
        &root,
        "COpenSSL",
        ModuleKind::SystemLibrary {
            pkg_config_name: Some("openssl".to_string()),
            pkg_config: None,
            providers: vec![swiftplan::core::SystemPackageProvider::Apt(vec![
                "libssl-dev".to_string(),
            ])],
        },
    )
    .with_module_map(ModuleMapType::Custom(PathBuf::from("/src/ssl/module.modulemap")));
    let app = swift_module(&root, "app", ModuleKind::SwiftExecutable)
        .with_sources(vec![PathBuf::from("/src/main.swift")])
        .with_dependencies(vec![ModuleDependency::module("COpenSSL")]);
    let graph = GraphBuilder::new()
        .package(
            root.module(syslib)
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
    assert!(plan
        .diagnostics()
        .warnings()
        .iter()
        .any(|w| w.contains("openssl") && w.contains("apt-get install libssl-dev")));
}
