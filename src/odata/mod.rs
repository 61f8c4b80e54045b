//! OData module
//!
//! HTTP client and fetch pipeline for D365 `$metadata`

pub mod client;
pub mod pipeline;

pub use client::{MetadataClient, ODataError};
pub use pipeline::{run_fetch, run_parse, FetchSummary, MetadataPaths, PipelineError};

#[cfg(test)]
pub(crate) mod test_server;
