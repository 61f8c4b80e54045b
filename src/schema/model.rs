//! Normalized metadata descriptors
//!
//! This is the shape of the persisted JSON artifact.

use serde::{Deserialize, Serialize};

/// Root of the normalized document: `{ "entities": [...] }`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub entities: Vec<EntityDescriptor>,
}

/// One `EntityType` declaration, flattened
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityDescriptor {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default)]
    pub properties: Vec<PropertyDescriptor>,
    #[serde(default)]
    pub navigation_properties: Vec<NavigationDescriptor>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub type_name: String,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub annotations: Vec<AnnotationDescriptor>,
}

/// Relationship to another entity type. `type_name` is the raw
/// qualified name, e.g. `Collection(Microsoft.Dynamics.CRM.contact)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationDescriptor {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub type_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationDescriptor {
    #[serde(default)]
    pub term: String,
    #[serde(default)]
    pub value: String,
}

impl Metadata {
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }
}
