use swiftplan_platform::{Platform, PlatformVersion};
use thiserror::Error;

pub type PlanResult<T> = anyhow::Result<T>;

/// Fatal failures of plan construction.
///
/// The first of these encountered during assembly aborts the plan; no
/// partial plan is ever returned. Non-fatal conditions go through
/// [`Diagnostics`](crate::util::Diagnostics) instead.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PlanError {
    #[error(
        "multiple products named '{name}' declared by packages: '{}'",
        .packages.join("', '")
    )]
    ProductNameCollision { name: String, packages: Vec<String> },

    #[error(
        "the module '{consumer_module}' (package '{consumer_package}', minimum {platform} \
         version {consumer_version}) depends on product '{producer_product}' (package \
         '{producer_package}', minimum {platform} version {producer_version}); raise the \
         {platform} deployment target of '{consumer_package}' to {producer_version}, or lower \
         the deployment target of '{producer_package}' to {consumer_version}"
    )]
    PlatformVersionIncompatible {
        consumer_module: String,
        consumer_package: String,
        consumer_version: PlatformVersion,
        producer_product: String,
        producer_package: String,
        producer_version: PlatformVersion,
        platform: Platform,
    },

    #[error("cyclic dependency declared: {}", .path.join(" -> "))]
    CycleDetected { path: Vec<String> },

    #[error("the package graph contains no buildable modules")]
    NoBuildableModule,

    #[error("artifact '{artifact}' does not support the target triple '{triple}'")]
    UnknownBinaryArtifactVariant { artifact: String, triple: String },
}
