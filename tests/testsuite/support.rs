//! Shared fixtures for the testsuite.

use swiftplan::core::plan::{BuildParameters, BuildPlan, Destination};
use swiftplan::core::PackageGraph;
use swiftplan::PlanResult;
use swiftplan_test_support::{debug_params, plan_with_fs, seeded_fs};

pub const LINUX: &str = "x86_64-unknown-linux-gnu";
pub const MACOS: &str = "arm64-apple-macosx";
pub const WINDOWS: &str = "x86_64-pc-windows-msvc";
pub const WASI: &str = "wasm32-unknown-wasi";

/// A host building on Linux, debug.
pub fn linux_host() -> BuildParameters {
    debug_params(LINUX, Destination::Host)
}

/// A host building on macOS, debug.
pub fn macos_host() -> BuildParameters {
    debug_params(MACOS, Destination::Host)
}

/// Build a plan over an in-memory filesystem seeded with the given
/// source files.
pub fn plan_sources(
    graph: &PackageGraph,
    target: BuildParameters,
    host: BuildParameters,
    files: &[(&str, &str)],
) -> PlanResult<BuildPlan> {
    plan_with_fs(graph, target, host, &seeded_fs(files))
}
