//! Schema module
//!
//! Converts OData `$metadata` XML into flat entity descriptors

pub mod model;
pub mod normalize;
pub mod xml;

pub use model::{
    AnnotationDescriptor, EntityDescriptor, Metadata, NavigationDescriptor, PropertyDescriptor,
};
pub use normalize::{normalize, normalize_xml, SchemaError};
pub use xml::parse_document;
