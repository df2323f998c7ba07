//! Lookup-target extraction: dataset rows into verification work items.

use crate::dataset::Dataset;
use crate::error::ArtsiftError;
use crate::source::Source;
use std::collections::HashSet;

/// One unit of verification work: what to fetch, and the join-key that
/// reconciles the outcome back onto the dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupTarget {
    /// Join-column value identifying the originating row.
    pub key: String,
    /// URL the verifier will request.
    pub request_url: String,
}

/// Build the verification work list for `dataset`.
///
/// Met: rows with an empty `Object ID` are skipped, duplicate identifiers
/// keep their first occurrence, and each remaining identifier is templated
/// onto `met_base_url`. Europeana: every row's `image_url` is taken as-is,
/// keyed by `europeana_id`. Missing columns are contract violations and
/// fail immediately.
pub fn extract_targets(
    dataset: &Dataset,
    source: Source,
    met_base_url: &str,
) -> Result<Vec<LookupTarget>, ArtsiftError> {
    match source {
        Source::Met => {
            let id_col = dataset.column_index(source.join_column())?;
            let base = met_base_url.trim_end_matches('/');
            let mut seen = HashSet::new();
            let mut targets = Vec::new();
            for row in dataset.rows() {
                let id = &row[id_col];
                if id.is_empty() || !seen.insert(id.clone()) {
                    continue;
                }
                targets.push(LookupTarget {
                    key: id.clone(),
                    request_url: format!("{base}/{id}"),
                });
            }
            Ok(targets)
        }
        Source::Europeana => {
            let url_col = dataset.column_index(source.url_column())?;
            let id_col = dataset.column_index(source.join_column())?;
            Ok(dataset
                .rows()
                .iter()
                .map(|row| LookupTarget {
                    key: row[id_col].clone(),
                    request_url: row[url_col].clone(),
                })
                .collect())
        }
    }
}
