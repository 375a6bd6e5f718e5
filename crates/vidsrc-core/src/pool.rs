//! Bounded background resolution
//!
//! Accepts requests, runs each on its own task and caps how many chains are
//! in flight at once.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::client::{PageFetcher, VidsrcClient};
use crate::error::{PipelineError, Result};
use crate::resolver::VidsrcResolver;
use crate::types::{ResolvedStream, StreamRequest};

/// Worker pool over a shared resolver
pub struct ResolverPool<F: PageFetcher + 'static = VidsrcClient> {
    resolver: Arc<VidsrcResolver<F>>,
    permits: Arc<Semaphore>,
}

impl<F: PageFetcher + 'static> Clone for ResolverPool<F> {
    fn clone(&self) -> Self {
        Self {
            resolver: Arc::clone(&self.resolver),
            permits: Arc::clone(&self.permits),
        }
    }
}

impl<F: PageFetcher + 'static> ResolverPool<F> {
    /// Pool sized by the resolver's `max_concurrency`
    pub fn new(resolver: VidsrcResolver<F>) -> Self {
        Self::from_shared(Arc::new(resolver))
    }

    /// Pool over a resolver that is also used elsewhere
    pub fn from_shared(resolver: Arc<VidsrcResolver<F>>) -> Self {
        let permits = resolver.config().max_concurrency.max(1);
        Self {
            resolver,
            permits: Arc::new(Semaphore::new(permits)),
        }
    }

    /// Number of runs that could start right now
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    /// Queue a request; it starts once a permit is free
    ///
    /// Must be called from within a Tokio runtime.
    pub fn submit(&self, request: StreamRequest) -> PoolHandle {
        let resolver = Arc::clone(&self.resolver);
        let permits = Arc::clone(&self.permits);
        let handle = tokio::spawn(async move {
            let _permit = permits
                .acquire_owned()
                .await
                .map_err(|_| PipelineError::Cancelled)?;
            debug!(content_id = %request.content_id, "pool run started");
            resolver.resolve(&request).await
        });
        PoolHandle { handle }
    }

    /// Submit every request and wait for all of them, in request order
    ///
    /// Dropping the returned future aborts every run that has not finished.
    pub async fn resolve_all(&self, requests: Vec<StreamRequest>) -> Vec<Result<ResolvedStream>> {
        let handles: Vec<PoolHandle> = requests.into_iter().map(|r| self.submit(r)).collect();
        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            results.push(handle.join().await);
        }
        results
    }
}

/// Handle to one submitted resolution
///
/// Dropping the handle aborts the run, including any request in flight.
pub struct PoolHandle {
    handle: JoinHandle<Result<ResolvedStream>>,
}

impl PoolHandle {
    /// Wait for the result
    ///
    /// # Errors
    /// Returns `Cancelled` if the run was aborted or its task panicked.
    pub async fn join(mut self) -> Result<ResolvedStream> {
        match (&mut self.handle).await {
            Ok(result) => result,
            Err(_) => Err(PipelineError::Cancelled),
        }
    }

    /// Abort the run, dropping any in-flight request
    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for PoolHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
