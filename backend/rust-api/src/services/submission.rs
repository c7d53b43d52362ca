use async_trait::async_trait;
use std::sync::Arc;

use crate::error::ClientError;
use crate::metrics::CLAIM_DELIVERIES_TOTAL;

/// Destination for claims that meet the length floor.
#[async_trait]
pub trait ClaimSink: Send + Sync {
    async fn submit_claim(&self, session_id: &str, claim: &str) -> Result<(), ClientError>;
}

/// Discards every claim. For offline play.
pub struct NullSink;

#[async_trait]
impl ClaimSink for NullSink {
    async fn submit_claim(&self, _session_id: &str, _claim: &str) -> Result<(), ClientError> {
        Ok(())
    }
}

/// Sends each claim on its own detached task and returns how many were spawned.
/// Failures are logged and counted, never retried.
pub fn dispatch_claims(
    sink: Arc<dyn ClaimSink>,
    session_id: &str,
    claims: Vec<(usize, String)>,
) -> usize {
    let count = claims.len();
    for (index, claim) in claims {
        let sink = Arc::clone(&sink);
        let session_id = session_id.to_string();
        tokio::spawn(async move {
            match sink.submit_claim(&session_id, &claim).await {
                Ok(()) => {
                    CLAIM_DELIVERIES_TOTAL.with_label_values(&["delivered"]).inc();
                    tracing::debug!(session_id = %session_id, index, "claim delivered");
                }
                Err(err) => {
                    CLAIM_DELIVERIES_TOTAL.with_label_values(&["failed"]).inc();
                    tracing::warn!(
                        session_id = %session_id,
                        index,
                        error = %err,
                        "claim submission failed"
                    );
                }
            }
        });
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FlakySink {
        outcomes: Mutex<Vec<(String, bool)>>,
    }

    #[async_trait]
    impl ClaimSink for FlakySink {
        async fn submit_claim(&self, _session_id: &str, claim: &str) -> Result<(), ClientError> {
            let ok = !claim.contains("fail");
            self.outcomes.lock().unwrap().push((claim.to_string(), ok));
            if ok {
                Ok(())
            } else {
                Err(ClientError::Decode("scoring endpoint unavailable".into()))
            }
        }
    }

    async fn wait_for_calls(sink: &FlakySink, expected: usize) {
        for _ in 0..100 {
            if sink.outcomes.lock().unwrap().len() >= expected {
                return;
            }
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn failures_are_isolated_per_claim() {
        let sink = Arc::new(FlakySink::default());
        let claims = vec![
            (0, "ok one".to_string()),
            (1, "fail here".to_string()),
            (2, "ok two".to_string()),
        ];

        assert_eq!(dispatch_claims(sink.clone(), "session_1", claims), 3);
        wait_for_calls(&sink, 3).await;

        let outcomes = sink.outcomes.lock().unwrap().clone();
        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes.iter().filter(|(_, ok)| *ok).count(), 2);
        assert!(outcomes.contains(&("ok two".to_string(), true)));
    }

    #[tokio::test]
    async fn nothing_to_dispatch() {
        assert_eq!(dispatch_claims(Arc::new(NullSink), "session_1", Vec::new()), 0);
    }
}
