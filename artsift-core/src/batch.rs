//! Bounded-concurrency verification scheduling.
//!
//! Every lookup target runs as its own task under a shared semaphore, so
//! at most `max_in_flight` requests are outstanding at once no matter how
//! large the batch is. All targets run to completion; a failing item is
//! already converted to `Absent` inside the verifier and never aborts the
//! batch.

use crate::extract::LookupTarget;
use crate::probe::{ProbeHttpClient, Verification, verify};
use crate::source::Source;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

/// Observer notified as verifications complete.
///
/// Invoked from completing tasks in completion order, not target order.
/// Implementations must stay cheap so progress reporting does not
/// serialize the fan-out.
pub trait ProgressSink: Send + Sync {
    fn on_complete(&self, done: usize, total: usize);
}

/// Default sink: a tracing line every `log_every` completions.
pub struct LogProgress {
    log_every: usize,
}

impl LogProgress {
    pub fn new(log_every: usize) -> Self {
        Self {
            log_every: log_every.max(1),
        }
    }
}

impl ProgressSink for LogProgress {
    fn on_complete(&self, done: usize, total: usize) {
        if done % self.log_every == 0 || done == total {
            debug!(done, total, "verification progress");
        }
    }
}

/// Run every target through the verifier with at most `max_in_flight`
/// requests outstanding.
///
/// Returns exactly one `(key, Verification)` pair per target, in target
/// order. Completion order is not meaningful; the pairing is. A task that
/// dies (panic or runtime shutdown) degrades to `Absent` for its key
/// instead of dropping the pair.
pub async fn run_batch(
    client: Arc<dyn ProbeHttpClient>,
    targets: Vec<LookupTarget>,
    source: Source,
    max_in_flight: usize,
    progress: Arc<dyn ProgressSink>,
) -> Vec<(String, Verification)> {
    let total = targets.len();
    let semaphore = Arc::new(Semaphore::new(max_in_flight.max(1)));
    let done = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::with_capacity(total);
    for target in targets {
        let client = Arc::clone(&client);
        let semaphore = Arc::clone(&semaphore);
        let done = Arc::clone(&done);
        let progress = Arc::clone(&progress);
        let key = target.key.clone();
        let handle = tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await.unwrap();
            let result = verify(client.as_ref(), &target.request_url, source).await;
            let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
            progress.on_complete(finished, total);
            (target.key, result)
        });
        handles.push((key, handle));
    }

    let mut results = Vec::with_capacity(total);
    for (key, handle) in handles {
        match handle.await {
            Ok(pair) => results.push(pair),
            Err(e) => {
                warn!(key = %key, error = %e, "verification task died, treating as absent");
                results.push((key, Verification::Absent));
            }
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProbeError;
    use crate::probe::{ScriptedProbeClient, ScriptedResponse};
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::time::Duration;

    /// Client that tracks how many requests are in flight at once.
    struct GaugeClient {
        in_flight: AtomicUsize,
        high_water: AtomicUsize,
    }

    impl GaugeClient {
        fn new() -> Self {
            Self {
                in_flight: AtomicUsize::new(0),
                high_water: AtomicUsize::new(0),
            }
        }

        async fn enter(&self) {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.high_water.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(2)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl ProbeHttpClient for GaugeClient {
        async fn get_json(&self, _url: &str) -> Result<Option<serde_json::Value>, ProbeError> {
            self.enter().await;
            Ok(Some(serde_json::json!({ "primaryImage": "https://img/x.jpg" })))
        }

        async fn get_prefix(
            &self,
            _url: &str,
            _limit: usize,
        ) -> Result<Option<Vec<u8>>, ProbeError> {
            self.enter().await;
            Ok(Some(vec![0xFF, 0xD8, 0xFF]))
        }
    }

    struct NullProgress;

    impl ProgressSink for NullProgress {
        fn on_complete(&self, _done: usize, _total: usize) {}
    }

    fn targets(n: usize) -> Vec<LookupTarget> {
        (0..n)
            .map(|i| LookupTarget {
                key: i.to_string(),
                request_url: format!("https://img.example.org/{i}.jpg"),
            })
            .collect()
    }

    #[tokio::test]
    async fn in_flight_requests_never_exceed_the_cap() {
        let client = Arc::new(GaugeClient::new());
        let results = run_batch(
            client.clone(),
            targets(1000),
            Source::Europeana,
            32,
            Arc::new(NullProgress),
        )
        .await;

        assert_eq!(results.len(), 1000);
        assert!(results.iter().all(|(_, v)| v.is_valid()));
        assert!(client.high_water.load(Ordering::SeqCst) <= 32);
    }

    #[tokio::test]
    async fn pairing_is_lossless_under_partial_failure() {
        let mut client = ScriptedProbeClient::new();
        for target in targets(100) {
            // odd keys get a transport failure, even keys a valid body
            let response = if target.key.parse::<usize>().unwrap() % 2 == 0 {
                ScriptedResponse::Bytes(vec![0xFF, 0xD8])
            } else {
                ScriptedResponse::Error("connection reset".into())
            };
            client = client.with_response(&target.request_url, response);
        }

        let results = run_batch(
            Arc::new(client),
            targets(100),
            Source::Europeana,
            16,
            Arc::new(NullProgress),
        )
        .await;

        assert_eq!(results.len(), 100);
        let keys: HashSet<_> = results.iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(keys.len(), 100);
        let valid = results.iter().filter(|(_, v)| v.is_valid()).count();
        assert_eq!(valid, 50);
    }

    #[tokio::test]
    async fn progress_sees_every_completion() {
        struct CountingSink {
            seen: AtomicUsize,
        }
        impl ProgressSink for CountingSink {
            fn on_complete(&self, _done: usize, total: usize) {
                assert_eq!(total, 40);
                self.seen.fetch_add(1, Ordering::SeqCst);
            }
        }

        let sink = Arc::new(CountingSink {
            seen: AtomicUsize::new(0),
        });
        run_batch(
            Arc::new(GaugeClient::new()),
            targets(40),
            Source::Europeana,
            4,
            sink.clone(),
        )
        .await;
        assert_eq!(sink.seen.load(Ordering::SeqCst), 40);
    }
}
