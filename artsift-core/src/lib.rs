//! Artsift — bulk image-URL verification for museum artwork datasets.
//!
//! Artwork dumps from the Met and Europeana list tens of thousands of
//! objects whose image links may be missing, dead, or pointing at an HTML
//! landing page instead of an image. This crate takes such a dataset,
//! verifies every candidate image reference against the live source under
//! a bounded concurrency cap, and returns the rows that have a usable
//! image URL.
//!
//! The only entry point external callers need is
//! [`pipeline::filter_by_image_availability`]; everything else is the
//! plumbing it orchestrates:
//!
//! - [`extract`] turns dataset rows into lookup targets
//! - [`probe`] verifies one target and classifies the response
//! - [`batch`] fans targets out under the concurrency cap
//! - [`reconcile`] joins results back and drops unverified rows

pub mod batch;
pub mod config;
pub mod dataset;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod probe;
pub mod reconcile;
pub mod source;

// Re-exports for convenience
pub use batch::{LogProgress, ProgressSink};
pub use config::{DEFAULT_MET_BASE_URL, PipelineConfig, load_config};
pub use dataset::Dataset;
pub use error::{ArtsiftError, ConfigError, DatasetError, ProbeError};
pub use pipeline::{
    FilterOutcome, PipelineStats, filter_by_image_availability, filter_with_client,
};
pub use probe::{
    ProbeHttpClient, ReqwestProbeClient, ScriptedProbeClient, ScriptedResponse, Verification,
};
pub use source::Source;
