//! Reconciliation of verification results back onto the dataset.

use crate::dataset::Dataset;
use crate::error::ArtsiftError;
use crate::probe::Verification;
use crate::source::Source;
use std::collections::HashMap;

/// Filter `dataset` down to rows whose join key verified.
///
/// Met rows additionally get the `image_url` column written from the
/// verified mapping, since the Met dataset never had URLs of its own.
/// Europeana rows already carry the verified URL and pass through
/// unchanged. The input dataset is left untouched.
pub fn reconcile(
    dataset: &Dataset,
    results: Vec<(String, Verification)>,
    source: Source,
) -> Result<Dataset, ArtsiftError> {
    let verified: HashMap<String, String> = results
        .into_iter()
        .filter_map(|(key, verification)| verification.into_url().map(|url| (key, url)))
        .collect();

    let join_col = dataset.column_index(source.join_column())?;
    let filtered = dataset.retain_rows(|row| verified.contains_key(&row[join_col]));

    match source {
        Source::Met => {
            // retain_rows guarantees every surviving key is in the mapping
            Ok(filtered.with_column(source.url_column(), |row| {
                verified[row[join_col].as_str()].clone()
            }))
        }
        Source::Europeana => Ok(filtered),
    }
}
