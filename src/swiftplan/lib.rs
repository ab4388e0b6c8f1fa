//! A build-plan engine for package graphs of Swift-family, C-family,
//! binary, plugin, and system-library modules.
//!
//! Given a resolved [`PackageGraph`](crate::core::PackageGraph), two
//! [`BuildParameters`](crate::core::plan::BuildParameters) records (one for
//! the target destination, one for the host), and a
//! [`Toolchain`](crate::core::plan::Toolchain), the engine produces a
//! [`BuildPlan`](crate::core::plan::BuildPlan): a fully resolved
//! description of every artifact to build, every compiler and linker
//! invocation, and the dependency ordering between them. The plan is a
//! pure description — executing it is the job of a downstream build
//! runner.

pub use crate::core::plan::{BuildParameters, BuildPlan, Destination, Toolchain};
pub use crate::core::PackageGraph;
pub use crate::util::errors::{PlanError, PlanResult};

pub mod core;
pub mod util;
