use crate::resource::Urn;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// The output attributes of resources that the provisioning engine has created. Deferred values
/// are resolved against this.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    resources: BTreeMap<Urn, Map<String, Value>>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the attributes of a created resource, replacing anything recorded before.
    pub fn insert(&mut self, urn: Urn, attributes: Map<String, Value>) {
        self.resources.insert(urn, attributes);
    }

    /// Builder style `insert`. Non-object values are ignored.
    pub fn with(mut self, urn: Urn, attributes: Value) -> Self {
        if let Value::Object(map) = attributes {
            self.insert(urn, map);
        }
        self
    }

    pub fn attributes(&self, urn: &Urn) -> Option<&Map<String, Value>> {
        self.resources.get(urn)
    }

    pub fn contains(&self, urn: &Urn) -> bool {
        self.resources.contains_key(urn)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
