//! Catalog module
//!
//! Read-only lookups over the persisted metadata JSON. Every command loads
//! the file again; nothing is cached between invocations.

pub mod markdown;

pub use markdown::{export_entity, render_entity};

use crate::schema::{EntityDescriptor, Metadata};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Catalog errors
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Metadata file not found: {0} (run `fetch` first)")]
    NotFound(PathBuf),

    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid metadata JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Entity '{0}' not found")]
    EntityNotFound(String),
}

/// Loaded metadata artifact
#[derive(Debug, Clone)]
pub struct Catalog {
    metadata: Metadata,
}

impl Catalog {
    /// Read and deserialize the JSON artifact
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let text = fs::read_to_string(path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => CatalogError::NotFound(path.to_path_buf()),
            _ => CatalogError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;

        let metadata: Metadata =
            serde_json::from_str(&text).map_err(|source| CatalogError::Json {
                path: path.to_path_buf(),
                source,
            })?;

        tracing::debug!(
            "Loaded {} entities from {}",
            metadata.entity_count(),
            path.display()
        );
        Ok(Self { metadata })
    }

    pub fn from_metadata(metadata: Metadata) -> Self {
        Self { metadata }
    }

    pub fn entities(&self) -> &[EntityDescriptor] {
        &self.metadata.entities
    }

    /// All entity names, sorted case-insensitively
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entities().iter().map(|e| e.name.as_str()).collect();
        names.sort_by_cached_key(|name| name.to_lowercase());
        names
    }

    /// Case-insensitive exact match on entity name; the first occurrence wins
    pub fn find(&self, name: &str) -> Option<&EntityDescriptor> {
        let wanted = name.to_lowercase();
        self.entities()
            .iter()
            .find(|e| e.name.to_lowercase() == wanted)
    }

    /// Like [`Catalog::find`] but reports a missing entity as an error
    pub fn get(&self, name: &str) -> Result<&EntityDescriptor, CatalogError> {
        self.find(name)
            .ok_or_else(|| CatalogError::EntityNotFound(name.to_string()))
    }

    /// Entities whose name contains `term` (case-insensitive). With
    /// `include_properties`, a matching property name also counts.
    pub fn search(&self, term: &str, include_properties: bool) -> Vec<&EntityDescriptor> {
        let term = term.to_lowercase();
        let mut matches: Vec<&EntityDescriptor> = self
            .entities()
            .iter()
            .filter(|e| {
                e.name.to_lowercase().contains(&term)
                    || (include_properties
                        && e.properties
                            .iter()
                            .any(|p| p.name.to_lowercase().contains(&term)))
            })
            .collect();
        matches.sort_by_cached_key(|e| e.name.to_lowercase());
        matches
    }
}
