//! Whole-plan invariants, enforced after assembly.

use indexmap::IndexMap;
use std::collections::BTreeMap;
use tracing::debug;

use crate::core::graph::{DependencyTarget, PackageGraph};
use crate::core::plan::module_description::ModuleBuildDescription;
use crate::core::plan::{Destination, PlanContext};
use crate::util::errors::{PlanError, PlanResult};

pub(crate) fn validate(
    cx: &PlanContext<'_>,
    descriptions: &IndexMap<(String, Destination), ModuleBuildDescription>,
) -> PlanResult<()> {
    check_product_names(cx.graph)?;
    check_platform_versions(cx, descriptions)?;
    check_buildable(descriptions)?;
    Ok(())
}

/// Product names must be unique across the graph (case-insensitively)
/// unless every product wearing the name has automatic linkage.
fn check_product_names(graph: &PackageGraph) -> PlanResult<()> {
    let mut by_name: BTreeMap<String, Vec<&std::sync::Arc<crate::core::product::ResolvedProduct>>> =
        BTreeMap::new();
    for product in graph.products() {
        by_name
            .entry(product.name().to_lowercase())
            .or_default()
            .push(product);
    }
    for (_, group) in by_name {
        if group.len() < 2 {
            continue;
        }
        if group.iter().all(|p| p.is_automatic_library()) {
            continue;
        }
        return Err(PlanError::ProductNameCollision {
            name: group[0].name().to_string(),
            packages: group
                .iter()
                .map(|p| p.package().as_str().to_string())
                .collect(),
        }
        .into());
    }
    Ok(())
}

/// Along every planned module → product edge, the consumer package's
/// minimum version for the currently built platform must cover the
/// producer package's. Only the platform of the edge's destination is
/// checked.
fn check_platform_versions(
    cx: &PlanContext<'_>,
    descriptions: &IndexMap<(String, Destination), ModuleBuildDescription>,
) -> PlanResult<()> {
    for ((_, destination), description) in descriptions {
        let module = description.module();
        let Some(platform) = cx.parameters(*destination).triple.platform() else {
            continue;
        };
        let consumer = cx.graph.package_of_module(module)?;
        let Some(consumer_version) = consumer.minimum_platform_version(platform) else {
            continue;
        };
        for dependency in module.dependencies() {
            let DependencyTarget::Product { package, name } = &dependency.target else {
                continue;
            };
            let Some(producer) = cx.graph.package(package) else {
                continue;
            };
            let Some(producer_version) = producer.minimum_platform_version(platform) else {
                continue;
            };
            if consumer_version < producer_version {
                return Err(PlanError::PlatformVersionIncompatible {
                    consumer_module: module.name().to_string(),
                    consumer_package: consumer.identity().as_str().to_string(),
                    consumer_version,
                    producer_product: name.clone(),
                    producer_package: producer.identity().as_str().to_string(),
                    producer_version,
                    platform,
                }
                .into());
            }
        }
    }
    debug!("platform versions compatible across {} descriptions", descriptions.len());
    Ok(())
}

/// A plan with nothing to compile is an error, not an empty success.
fn check_buildable(
    descriptions: &IndexMap<(String, Destination), ModuleBuildDescription>,
) -> PlanResult<()> {
    let buildable = descriptions.values().any(|d| {
        matches!(
            d,
            ModuleBuildDescription::Swift(_) | ModuleBuildDescription::Clang(_)
        )
    });
    if !buildable {
        return Err(PlanError::NoBuildableModule.into());
    }
    Ok(())
}
