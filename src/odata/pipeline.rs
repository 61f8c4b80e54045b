//! Fetch pipeline
//!
//! fetch → raw XML snapshot → normalize → JSON artifact. The JSON file is
//! only written once normalization has succeeded.

use super::client::{MetadataClient, ODataError};
use crate::schema::{normalize_xml, Metadata, SchemaError};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    OData(#[from] ODataError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize metadata: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML snapshot and JSON output are the same file: {0}")]
    PathConflict(PathBuf),
}

/// Output locations: the JSON artifact and its raw XML sibling
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataPaths {
    pub xml: PathBuf,
    pub json: PathBuf,
}

impl MetadataPaths {
    /// `out/metadata.json` pairs with `out/metadata.xml`; a JSON path that
    /// already ends in `.xml` pairs with `<stem>.raw.xml` instead
    pub fn from_json_path(json: impl Into<PathBuf>) -> Self {
        let json = json.into();
        let mut xml = json.with_extension("xml");
        if xml == json {
            xml = json.with_extension("raw.xml");
        }
        Self { xml, json }
    }

    /// Reject a pair where writing the JSON would overwrite the snapshot
    pub fn ensure_distinct(&self) -> Result<(), PipelineError> {
        let same = self.xml == self.json
            || matches!(
                (fs::canonicalize(&self.xml), fs::canonicalize(&self.json)),
                (Ok(a), Ok(b)) if a == b
            );
        if same {
            return Err(PipelineError::PathConflict(self.json.clone()));
        }
        Ok(())
    }
}

/// Result of a completed fetch or parse run
#[derive(Debug, Clone)]
pub struct FetchSummary {
    pub entity_count: usize,
    pub xml_bytes: usize,
    pub paths: MetadataPaths,
}

/// Download `$metadata`, keep the raw snapshot and persist the normalized JSON
pub async fn run_fetch(
    client: &MetadataClient,
    url: &str,
    token: &str,
    paths: &MetadataPaths,
) -> Result<FetchSummary, PipelineError> {
    paths.ensure_distinct()?;
    let xml = client.fetch_metadata(url, token).await?;

    write_file(&paths.xml, xml.as_bytes())?;
    tracing::info!("Saved raw metadata to {}", paths.xml.display());

    persist(&xml, paths)
}

/// Normalize an existing XML snapshot without touching the network
pub fn run_parse(xml_path: &Path, json_path: &Path) -> Result<FetchSummary, PipelineError> {
    let paths = MetadataPaths {
        xml: xml_path.to_path_buf(),
        json: json_path.to_path_buf(),
    };
    paths.ensure_distinct()?;

    let xml = fs::read_to_string(xml_path).map_err(|source| PipelineError::Io {
        path: xml_path.to_path_buf(),
        source,
    })?;
    persist(&xml, &paths)
}

fn persist(xml: &str, paths: &MetadataPaths) -> Result<FetchSummary, PipelineError> {
    let metadata: Metadata = normalize_xml(xml)?;

    let json = serde_json::to_string_pretty(&metadata)?;
    write_file(&paths.json, json.as_bytes())?;
    tracing::info!(
        "Saved {} entities to {}",
        metadata.entity_count(),
        paths.json.display()
    );

    Ok(FetchSummary {
        entity_count: metadata.entity_count(),
        xml_bytes: xml.len(),
        paths: paths.clone(),
    })
}

pub(crate) fn write_file(path: &Path, contents: &[u8]) -> Result<(), PipelineError> {
    let io_err = |source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    fs::write(path, contents).map_err(io_err)
}
