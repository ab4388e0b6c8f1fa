//! Pre-built artifact selection and its effect on compile and link
//! lines.

use std::path::PathBuf;
use swiftplan::core::plan::{Destination, ModuleBuildDescription};
use swiftplan::core::{ModuleDependency, ModuleKind, ProductKind};
use swiftplan::PlanError;
use swiftplan_test_support::{debug_params, swift_module, GraphBuilder, PackageBuilder};

use crate::support::{linux_host, plan_sources, LINUX, MACOS};

const MANIFEST: &str = r#"{
    "variants": [
        { "path": "linux/libCrypto.a", "platform": "linux", "archs": ["x86_64"], "headersPath": "linux/include" },
        { "path": "Crypto.framework", "platform": "macos" }
    ]
}"#;

fn graph() -> swiftplan::PackageGraph {
    let root = PackageBuilder::new("demo");
    let artifact = swift_module(
        &root,
        "Crypto",
        ModuleKind::BinaryArtifact {
            path: PathBuf::from("/artifacts/Crypto.artifactbundle"),
        },
    );
    let app = swift_module(&root, "app", ModuleKind::SwiftExecutable)
        .with_sources(vec![PathBuf::from("/src/main.swift")])
        .with_dependencies(vec![ModuleDependency::module("Crypto")]);
    GraphBuilder::new()
        .package(
            root.module(artifact)
                .module(app)
                .product("app", ProductKind::Executable, &["app"]),
        )
        .build()
}

#[test]
fn matching_variant_feeds_compile_and_link_lines() {
    let graph = graph();
    let plan = plan_sources(
        &graph,
        debug_params(LINUX, Destination::Target),
        linux_host(),
        &[
            ("/src/main.swift", "print(1)\n"),
            ("/artifacts/Crypto.artifactbundle/info.json", MANIFEST),
        ],
    )
    .unwrap();

    let compile = plan.compile_arguments("app", Destination::Target).unwrap();
    assert!(compile
        .contains(&"/artifacts/Crypto.artifactbundle/linux/include".to_string()));

    let link = plan
        .link_arguments(&"demo".into(), "app", Destination::Target)
        .unwrap();
    assert!(link.contains(&"-lCrypto".to_string()));
    assert!(link.contains(&"/artifacts/Crypto.artifactbundle/linux".to_string()));
}

#[test]
fn framework_variant_on_darwin() {
    let graph = graph();
    let plan = plan_sources(
        &graph,
        debug_params(MACOS, Destination::Target),
        linux_host(),
        &[
            ("/src/main.swift", "print(1)\n"),
            ("/artifacts/Crypto.artifactbundle/info.json", MANIFEST),
        ],
    )
    .unwrap();

    let link = plan
        .link_arguments(&"demo".into(), "app", Destination::Target)
        .unwrap();
    let framework_at = link.iter().position(|a| a == "-framework").unwrap();
    assert_eq!(link[framework_at + 1], "Crypto");
}

#[test]
fn unmatched_triple_is_fatal() {
    let graph = graph();
    let err = plan_sources(
        &graph,
        debug_params("wasm32-unknown-wasi", Destination::Target),
        linux_host(),
        &[
            ("/src/main.swift", "print(1)\n"),
            ("/artifacts/Crypto.artifactbundle/info.json", MANIFEST),
        ],
    )
    .unwrap_err();
    let plan_error = err.downcast_ref::<PlanError>().expect("typed error");
    assert!(matches!(
        plan_error,
        PlanError::UnknownBinaryArtifactVariant { .. }
    ));
    let message = err.to_string();
    assert!(message.contains("Crypto") && message.contains("wasm32-unknown-wasi"));
}

#[test]
fn bundled_executables_are_exposed_as_tools() {
    let manifest = r#"{
        "variants": [
            { "path": "bin/protoc", "platform": "linux", "archs": ["x86_64"] }
        ]
    }"#;
    let root = PackageBuilder::new("demo");
    let tool = swift_module(
        &root,
        "protoc",
        ModuleKind::BinaryArtifact {
            path: PathBuf::from("/artifacts/protoc.artifactbundle"),
        },
    );
    let app = swift_module(&root, "app", ModuleKind::SwiftExecutable)
        .with_sources(vec![PathBuf::from("/src/main.swift")])
        .with_dependencies(vec![ModuleDependency::module("protoc")]);
    let graph = GraphBuilder::new()
        .package(
            root.module(tool)
                .module(app)
                .product("app", ProductKind::Executable, &["app"]),
        )
        .build();

    let plan = plan_sources(
        &graph,
        debug_params(LINUX, Destination::Target),
        linux_host(),
        &[
            ("/src/main.swift", "print(1)\n"),
            ("/artifacts/protoc.artifactbundle/info.json", manifest),
        ],
    )
    .unwrap();

    let description = plan
        .module_description("protoc", Destination::Target)
        .unwrap();
    let ModuleBuildDescription::Binary(binary) = description else {
        panic!("expected a binary description");
    };
    assert_eq!(
        binary.tools(),
        vec![(
            "protoc".to_string(),
            PathBuf::from("/artifacts/protoc.artifactbundle/bin/protoc")
        )]
    );
}
