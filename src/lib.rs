//! D365 Metadata Library
//!
//! Fetches the OData `$metadata` document of a Microsoft Dynamics 365
//! endpoint, normalizes it into a JSON entity catalog and answers
//! list/show/search/export queries against that catalog.

pub mod catalog;
pub mod config;
pub mod odata;
pub mod schema;

pub use catalog::{Catalog, CatalogError};
pub use config::{Config, RuntimeConfig};
pub use odata::{MetadataClient, MetadataPaths, ODataError};
pub use schema::{normalize, normalize_xml, EntityDescriptor, Metadata, SchemaError};
