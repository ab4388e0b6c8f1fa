//! JSON form of a finished plan, for the downstream build executor.

use serde::Serialize;

use crate::core::plan::{BuildPlan, Destination};
use crate::util::errors::PlanResult;
use crate::util::Invocation;

#[derive(Debug, Serialize)]
pub struct SerializedPlan {
    pub modules: Vec<SerializedModule>,
    pub products: Vec<SerializedProduct>,
}

#[derive(Debug, Serialize)]
pub struct SerializedModule {
    pub name: String,
    pub package: String,
    pub destination: Destination,
    pub invocations: Vec<Invocation>,
    pub outputs: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SerializedProduct {
    pub name: String,
    pub package: String,
    pub destination: Destination,
    pub invocation: Invocation,
    pub objects: Vec<String>,
    pub binary: String,
}

impl BuildPlan {
    /// The plan flattened into serializable entries, in plan order.
    pub fn serialized(&self) -> SerializedPlan {
        let modules = self
            .module_descriptions()
            .map(|((name, destination), description)| SerializedModule {
                name: name.clone(),
                package: description.module().package().as_str().to_string(),
                destination: *destination,
                invocations: description.invocations(),
                outputs: description
                    .output_paths()
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect(),
            })
            .collect();
        let products = self
            .product_descriptions()
            .map(|description| SerializedProduct {
                name: description.product().name().to_string(),
                package: description.product().package().as_str().to_string(),
                destination: description.destination(),
                invocation: description.invocation(),
                objects: description
                    .objects()
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect(),
                binary: description.binary_path().display().to_string(),
            })
            .collect();
        SerializedPlan { modules, products }
    }

    pub fn to_json(&self) -> PlanResult<String> {
        Ok(serde_json::to_string_pretty(&self.serialized())?)
    }
}
