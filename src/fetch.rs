use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::AbortHandle;

struct InFlight {
    ticket: u64,
    handle: AbortHandle,
}

/// Keeps at most one outstanding request per key.
///
/// Starting a request for a key aborts the one already running for it, and a
/// result is only handed back while its request is still the latest one, so
/// a slow early response can never overwrite a later one.
pub struct RequestGate<K> {
    inflight: Arc<Mutex<HashMap<K, InFlight>>>,
    tickets: Arc<AtomicU64>,
}

impl<K> Clone for RequestGate<K> {
    fn clone(&self) -> Self {
        Self {
            inflight: Arc::clone(&self.inflight),
            tickets: Arc::clone(&self.tickets),
        }
    }
}

impl<K> Default for RequestGate<K> {
    fn default() -> Self {
        Self {
            inflight: Arc::new(Mutex::new(HashMap::new())),
            tickets: Arc::new(AtomicU64::new(0)),
        }
    }
}

impl<K> RequestGate<K>
where
    K: Eq + Hash + Clone + std::fmt::Debug + Send + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `request` as the latest request for `key`.
    ///
    /// Returns `None` when the request was superseded before it finished.
    pub async fn run<F, T>(&self, key: K, request: F) -> Option<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let ticket = self.tickets.fetch_add(1, Ordering::Relaxed);
        let task = tokio::spawn(request);
        {
            let mut inflight = self.inflight.lock().await;
            let previous = inflight.insert(
                key.clone(),
                InFlight {
                    ticket,
                    handle: task.abort_handle(),
                },
            );
            if let Some(previous) = previous {
                tracing::debug!("request {} for {key:?} superseded", previous.ticket);
                previous.handle.abort();
            }
        }

        let outcome = task.await;

        let mut inflight = self.inflight.lock().await;
        let latest = inflight.get(&key).map(|f| f.ticket) == Some(ticket);
        if latest {
            inflight.remove(&key);
        }
        drop(inflight);

        match outcome {
            Ok(value) if latest => Some(value),
            Ok(_) => None,
            Err(e) if e.is_cancelled() => None,
            Err(e) => {
                tracing::error!("request {ticket} for {key:?} panicked: {e}");
                None
            }
        }
    }

    /// Whether a request for `key` is still outstanding.
    pub async fn is_loading(&self, key: &K) -> bool {
        self.inflight.lock().await.contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn later_request_wins() {
        let gate = RequestGate::new();

        let slow = {
            let gate = gate.clone();
            tokio::spawn(async move {
                gate.run(1, async {
                    tokio::time::sleep(Duration::from_millis(500)).await;
                    "slow"
                })
                .await
            })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(gate.is_loading(&1).await);

        let fast = gate.run(1, async { "fast" }).await;

        assert_eq!(fast, Some("fast"));
        assert_eq!(slow.await.unwrap(), None);
        assert!(!gate.is_loading(&1).await);
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let gate = RequestGate::new();
        let (a, b) = tokio::join!(
            gate.run("alice", async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                1
            }),
            gate.run("bob", async { 2 }),
        );
        assert_eq!(a, Some(1));
        assert_eq!(b, Some(2));
    }
}
