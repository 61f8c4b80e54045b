//! XML to generic tree conversion
//!
//! Mirrors an XML document as nested JSON objects: attributes and child
//! elements share one object per element, namespace prefixes are dropped,
//! and a repeated child name becomes an array in document order. An element
//! with only text (no attributes, no children) collapses to that string, so
//! `<String>x</String>` reads the same as a `String="x"` attribute.

use super::normalize::SchemaError;
use roxmltree::{Document, Node};
use serde_json::{Map, Value};

/// Member name used for text content of elements that also carry
/// attributes or children
pub const TEXT_KEY: &str = "#text";

/// Parse XML text and return the root element as a JSON object
pub fn parse_document(xml: &str) -> Result<Value, SchemaError> {
    tracing::debug!("Parsing metadata XML ({} bytes)", xml.len());

    let doc = Document::parse(xml)?;
    let root = doc.root_element();

    tracing::debug!("Root element: {}", root.tag_name().name());
    Ok(element_to_value(root))
}

fn element_to_value(node: Node<'_, '_>) -> Value {
    let mut map = Map::new();

    for attr in node.attributes() {
        map.insert(attr.name().to_string(), Value::String(attr.value().to_string()));
    }

    let mut text = String::new();
    let mut has_children = false;

    for child in node.children() {
        if child.is_element() {
            has_children = true;
            let name = child.tag_name().name();
            if node.attributes().any(|a| a.name() == name) {
                tracing::debug!("Dropping <{}> element shadowed by attribute", name);
                continue;
            }
            insert_child(&mut map, name, element_to_value(child));
        } else if child.is_text() {
            if let Some(t) = child.text() {
                text.push_str(t);
            }
        }
    }

    let text = text.trim();
    if !text.is_empty() {
        if map.is_empty() && !has_children {
            return Value::String(text.to_string());
        }
        map.insert(TEXT_KEY.to_string(), Value::String(text.to_string()));
    }

    Value::Object(map)
}

fn insert_child(map: &mut Map<String, Value>, name: &str, value: Value) {
    if !map.contains_key(name) {
        map.insert(name.to_string(), value);
        return;
    }

    match map.get_mut(name) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {}
    }
}
