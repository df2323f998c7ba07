//! Upstream catalogs the pipeline can verify against.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which upstream catalog a dataset came from.
///
/// The source decides how lookup targets are built, how a response is
/// classified, and which column joins results back onto the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Metropolitan Museum of Art REST API: one JSON object lookup per
    /// identifier, image URL taken from the response.
    Met,
    /// Europeana aggregator: the dataset already carries candidate image
    /// URLs, each verified in place.
    Europeana,
}

impl Source {
    /// Column whose values join verification results back to rows.
    pub fn join_column(&self) -> &'static str {
        match self {
            Source::Met => "Object ID",
            Source::Europeana => "europeana_id",
        }
    }

    /// Column holding the image URL. Read by the Europeana extractor,
    /// written by the Met reconciler.
    pub fn url_column(&self) -> &'static str {
        "image_url"
    }
}

impl FromStr for Source {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "met" => Ok(Source::Met),
            "europeana" => Ok(Source::Europeana),
            _ => Err(ConfigError::InvalidSource {
                given: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Met => write!(f, "met"),
            Source::Europeana => write!(f, "europeana"),
        }
    }
}
