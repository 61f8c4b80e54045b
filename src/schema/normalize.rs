//! Metadata normalizer
//!
//! Flattens the generic XML tree of an EDMX document into a list of
//! [`EntityDescriptor`]s. Every node that may repeat in the XML (Schema,
//! EntityType, PropertyRef, Property, NavigationProperty, Annotation) is
//! read through [`one_or_many`] so a single element and a one-element
//! array produce the same output.

use super::model::{
    AnnotationDescriptor, EntityDescriptor, Metadata, NavigationDescriptor, PropertyDescriptor,
};
use super::xml::parse_document;
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;

/// Schema conversion errors
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("XML parse error: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("Invalid metadata format: DataServices.Schema not found")]
    MissingSchema,
}

/// Parse and normalize a raw `$metadata` XML document
pub fn normalize_xml(xml: &str) -> Result<Metadata, SchemaError> {
    let root = parse_document(xml)?;
    normalize(&root)
}

/// Normalize the root element tree (the `Edmx` element) into entity descriptors
pub fn normalize(root: &Value) -> Result<Metadata, SchemaError> {
    let schemas = root
        .get("DataServices")
        .and_then(|ds| ds.get("Schema"))
        .ok_or(SchemaError::MissingSchema)?;

    let mut entities = Vec::new();
    let mut seen = HashSet::new();

    for schema in one_or_many(schemas) {
        let namespace = attr(schema, "Namespace").unwrap_or_default();

        for entity_type in one_or_many(schema.get("EntityType")) {
            let entity = entity_descriptor(entity_type);

            if !seen.insert(entity.name.to_lowercase()) {
                tracing::warn!(
                    "Duplicate entity name '{}' in schema '{}'; lookups resolve to the first occurrence",
                    entity.name,
                    namespace
                );
            }

            entities.push(entity);
        }
    }

    tracing::info!("Normalized {} entities", entities.len());
    Ok(Metadata { entities })
}

/// View a possibly-repeated node as a sequence: absent is empty, an array
/// yields its items, anything else is a single item.
pub fn one_or_many<'a>(node: impl Into<Option<&'a Value>>) -> Vec<&'a Value> {
    match node.into() {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().collect(),
        Some(other) => vec![other],
    }
}

fn entity_descriptor(node: &Value) -> EntityDescriptor {
    let keys = one_or_many(node.get("Key").and_then(|key| key.get("PropertyRef")))
        .into_iter()
        .map(|r| attr(r, "Name").unwrap_or_default())
        .collect();

    let properties = one_or_many(node.get("Property"))
        .into_iter()
        .map(property_descriptor)
        .collect();

    let navigation_properties = one_or_many(node.get("NavigationProperty"))
        .into_iter()
        .map(|nav| NavigationDescriptor {
            name: attr(nav, "Name").unwrap_or_default(),
            type_name: attr(nav, "Type").unwrap_or_default(),
        })
        .collect();

    EntityDescriptor {
        name: attr(node, "Name").unwrap_or_default(),
        keys,
        properties,
        navigation_properties,
    }
}

fn property_descriptor(node: &Value) -> PropertyDescriptor {
    let annotations = one_or_many(node.get("Annotation"))
        .into_iter()
        .map(|a| AnnotationDescriptor {
            term: attr(a, "Term").unwrap_or_default(),
            value: annotation_value(a),
        })
        .collect();

    PropertyDescriptor {
        name: attr(node, "Name").unwrap_or_default(),
        type_name: attr(node, "Type").unwrap_or_default(),
        // Only the literal "true" counts
        nullable: node.get("Nullable").and_then(Value::as_str) == Some("true"),
        annotations,
    }
}

/// First present of String, Bool, EnumMember; empty otherwise
fn annotation_value(node: &Value) -> String {
    ["String", "Bool", "EnumMember"]
        .iter()
        .find_map(|name| attr(node, name))
        .unwrap_or_default()
}

/// Scalar member as text: an attribute or a text-only child element.
/// Objects and arrays are structured children and yield `None`.
fn attr(node: &Value, name: &str) -> Option<String> {
    match node.get(name)? {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
