//! Single-flight session creation
//!
//! Wraps the `async_singleflight` crate so that concurrent subscribe requests
//! for a channel that has no session yet collapse into one creation attempt:
//! the first caller drives the work, later callers wait for its result.

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

#[derive(Debug, Clone, thiserror::Error)]
pub enum SingleFlightError<E> {
    /// The caller driving the shared work panicked or was cancelled, so
    /// there is no outcome to share.
    #[error("single-flight leader dropped or panicked")]
    LeaderFailed,
    /// The shared work itself failed; every waiter receives this.
    #[error("{0}")]
    Inner(E),
}

/// Deduplicates concurrent executions by key.
#[derive(Clone)]
pub struct SingleFlight<K, V, E>
where
    K: Hash + Eq + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    group: Arc<async_singleflight::Group<K, V, E>>,
}

impl<K, V, E> SingleFlight<K, V, E>
where
    K: Hash + Eq + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    #[must_use]
    pub fn new() -> Self {
        Self {
            group: Arc::new(async_singleflight::Group::new()),
        }
    }

    /// Execute `f` at most once for a given key.
    ///
    /// If another call for the same key is in progress, this waits for that
    /// result instead of executing again.
    pub async fn do_work<Fut>(&self, key: K, f: Fut) -> Result<V, SingleFlightError<E>>
    where
        Fut: std::future::Future<Output = Result<V, E>> + Send,
    {
        // Group::work flattens both failure modes into Result<V, Option<E>>;
        // Err(None) means the leader dropped without producing an outcome
        self.group
            .work(&key, f)
            .await
            .map_err(|opt_err| match opt_err {
                Some(inner) => SingleFlightError::Inner(inner),
                None => SingleFlightError::LeaderFailed,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::models::{ChannelKey, Platform};
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::{sleep, Duration};

    type CreationFlight = SingleFlight<ChannelKey, String, Arc<Error>>;

    fn key(identifier: &str) -> ChannelKey {
        ChannelKey::new(Platform::Youtube, identifier)
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_creation() {
        let flight = CreationFlight::new();
        let creations = Arc::new(AtomicU32::new(0));

        let mut handles = vec![];
        for _ in 0..10 {
            let flight = flight.clone();
            let creations = creations.clone();
            handles.push(tokio::spawn(async move {
                flight
                    .do_work(key("somechannel"), async move {
                        // hold the flight open long enough for everyone to join
                        sleep(Duration::from_millis(50)).await;
                        creations.fetch_add(1, Ordering::SeqCst);
                        Ok("session-a".to_string())
                    })
                    .await
            }));
        }

        for handle in handles {
            let session = handle.await.expect("join").expect("do_work");
            assert_eq!(session, "session-a");
        }
        assert_eq!(creations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_distinct_channels_do_not_share_a_flight() {
        let flight = CreationFlight::new();
        let creations = Arc::new(AtomicU32::new(0));

        let mut handles = vec![];
        for identifier in ["channel_a", "channel_b"] {
            let flight = flight.clone();
            let creations = creations.clone();
            handles.push(tokio::spawn(async move {
                flight
                    .do_work(key(identifier), async move {
                        creations.fetch_add(1, Ordering::SeqCst);
                        Ok(identifier.to_string())
                    })
                    .await
            }));
        }

        for handle in handles {
            handle.await.expect("join").expect("do_work");
        }
        assert_eq!(creations.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_followers_observe_the_leaders_failure() {
        let flight = CreationFlight::new();

        let mut handles = vec![];
        for _ in 0..5 {
            let flight = flight.clone();
            handles.push(tokio::spawn(async move {
                flight
                    .do_work(key("offline"), async move {
                        sleep(Duration::from_millis(50)).await;
                        Err(Arc::new(Error::StreamNotLive))
                    })
                    .await
            }));
        }

        for handle in handles {
            match handle.await.expect("join") {
                Err(SingleFlightError::Inner(err)) => {
                    // the shared error keeps its variant, so the wire code
                    // survives for every waiter
                    assert!(matches!(err.clone_outcome(), Error::StreamNotLive));
                }
                other => panic!("expected shared not-live failure, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_failed_channel_can_be_retried() {
        let flight = CreationFlight::new();

        let result = flight
            .do_work(key("flaky"), async {
                Err(Arc::new(Error::StartFailed("first attempt".to_string())))
            })
            .await;
        assert!(result.is_err());

        // a failed flight must not poison the key; the stream may be live
        // next time
        let session = flight
            .do_work(key("flaky"), async { Ok("session-b".to_string()) })
            .await
            .expect("retry");
        assert_eq!(session, "session-b");
    }
}
