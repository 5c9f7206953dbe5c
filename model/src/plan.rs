use crate::resource::Urn;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// A serializable description of everything in a [`Stack`](crate::Stack), in creation order.
/// This is the document handed to the provisioning engine.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub stack: String,
    pub resources: Vec<PlannedResource>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedResource {
    pub urn: Urn,
    pub kind: String,
    pub name: String,
    /// Resources in the same layer do not depend on each other.
    pub layer: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<Urn>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<Urn>,
    pub inputs: BTreeMap<String, Value>,
}

impl Plan {
    pub fn get(&self, urn: &Urn) -> Option<&PlannedResource> {
        self.resources.iter().find(|resource| &resource.urn == urn)
    }

    /// All planned resources of the given kind.
    pub fn of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a PlannedResource> {
        self.resources
            .iter()
            .filter(move |resource| resource.kind == kind)
    }
}
