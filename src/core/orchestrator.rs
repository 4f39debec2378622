//! Fan-out/join of the primary and related-items lookups.

use crate::domain::ports::{Lookup, StreamSource};
use crate::utils::error::{ErrorKind, RemoteError};
use futures::stream::BoxStream;
use std::sync::Arc;

/// The assembled aggregate before it is mapped onto the wire type.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateResult<P, R> {
    pub primary: P,
    pub related: Vec<R>,
}

/// Joins a load-bearing primary lookup with a best-effort related lookup.
///
/// The primary decides the outcome: any failure there fails the aggregate.
/// A related lookup that reports `NotFound` contributes an empty list; any
/// other related failure fails the aggregate even though the primary
/// succeeded.
pub struct Aggregator<P, R> {
    primary: Arc<P>,
    related: Arc<R>,
}

impl<P, R> Clone for Aggregator<P, R> {
    fn clone(&self) -> Self {
        Self {
            primary: Arc::clone(&self.primary),
            related: Arc::clone(&self.related),
        }
    }
}

impl<P, R, I> Aggregator<P, R>
where
    P: Lookup,
    R: Lookup<Output = Vec<I>>,
    I: Send + 'static,
{
    pub fn new(primary: P, related: R) -> Self {
        Self {
            primary: Arc::new(primary),
            related: Arc::new(related),
        }
    }

    pub async fn assemble(
        &self,
        key: &str,
    ) -> Result<AggregateResult<P::Output, I>, RemoteError> {
        // The related call goes out before the primary answers.
        let related = Arc::clone(&self.related);
        let related_key = key.to_string();
        let related_task = tokio::spawn(async move { related.lookup(&related_key).await });

        let primary = match self.primary.lookup(key).await {
            Ok(primary) => primary,
            Err(err) => {
                related_task.abort();
                tracing::info!(key, kind = ?err.kind, "Primary lookup failed, aggregate aborted");
                return Err(err);
            }
        };

        let related = match related_task.await {
            Ok(Ok(items)) => items,
            Ok(Err(err)) if err.kind == ErrorKind::NotFound => {
                tracing::debug!(key, "No related items, continuing with an empty list");
                Vec::new()
            }
            Ok(Err(err)) => {
                tracing::warn!(key, kind = ?err.kind, error = %err, "Related lookup failed");
                return Err(err);
            }
            Err(join_err) => {
                return Err(RemoteError::transport(format!(
                    "related lookup for {} did not complete: {}",
                    key, join_err
                )));
            }
        };

        Ok(AggregateResult { primary, related })
    }
}

impl<P, R> Aggregator<P, R>
where
    P: StreamSource,
{
    /// Live feed of primary entities, passed through without any join.
    pub fn stream_primary(&self) -> BoxStream<'static, Result<P::Item, RemoteError>> {
        self.primary.stream()
    }
}
