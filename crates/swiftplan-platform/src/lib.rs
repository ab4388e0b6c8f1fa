//! Platform and triple handling for build planning.
//!
//! A [`Triple`] identifies what machine code is produced for; a
//! [`Platform`] is the coarser name used by package manifests to scope
//! dependencies and build settings ("macos", "linux", ...). A
//! [`BuildCondition`] attached to a dependency edge or a build setting is
//! evaluated against a [`BuildEnvironment`] to decide whether the edge or
//! setting applies to the build at hand.

mod condition;
mod error;
mod platform;
mod triple;

pub use condition::{condition_satisfied, BuildCondition, BuildEnvironment, Configuration};
pub use error::{ParseError, ParseErrorKind};
pub use platform::{Platform, PlatformVersion};
pub use triple::{Arch, Os, Triple, Vendor};
