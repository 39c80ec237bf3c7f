//! Request capability for the parameter store, plus its request cache.

use super::types::{GetParameterOutput, GetParameterRequest, RequestOptions, StoreFailure};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

/// Something that can issue `getParameter` calls against a parameter store.
///
/// Implementations own transport, retries and timeouts. Failures come back as
/// a [`StoreFailure`] carrying the store's status code.
#[async_trait]
pub trait ParameterRequest: Send + Sync {
    /// Display name for logging.
    fn name(&self) -> &str;

    async fn get_parameter(
        &self,
        request: &GetParameterRequest,
        options: RequestOptions,
    ) -> Result<GetParameterOutput, StoreFailure>;
}

#[async_trait]
impl<T: ParameterRequest + ?Sized> ParameterRequest for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn get_parameter(
        &self,
        request: &GetParameterRequest,
        options: RequestOptions,
    ) -> Result<GetParameterOutput, StoreFailure> {
        (**self).get_parameter(request, options).await
    }
}

/// Wraps a request capability with a request-level cache.
///
/// Only successful responses are remembered; failures are retried on the next
/// call. Calls with `use_cache: false` always go to the inner capability.
pub struct CachedRequester<R> {
    inner: R,
    cache: DashMap<GetParameterRequest, GetParameterOutput>,
}

impl<R: ParameterRequest> CachedRequester<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            cache: DashMap::new(),
        }
    }

    /// Number of cached responses.
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }
}

#[async_trait]
impl<R: ParameterRequest> ParameterRequest for CachedRequester<R> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn get_parameter(
        &self,
        request: &GetParameterRequest,
        options: RequestOptions,
    ) -> Result<GetParameterOutput, StoreFailure> {
        if options.use_cache {
            if let Some(hit) = self.cache.get(request) {
                debug!(
                    "{}.{} cache hit for '{}'",
                    request.service(),
                    request.operation(),
                    request.name
                );
                return Ok(hit.value().clone());
            }
        }

        let output = self.inner.get_parameter(request, options).await?;
        if options.use_cache {
            self.cache.insert(request.clone(), output.clone());
        }
        Ok(output)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::StubStore;
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn cached_request_hits_inner_once() {
        let stub = Arc::new(StubStore::new().with_parameter("/a", "c", "arn"));
        let cached = CachedRequester::new(stub.clone());
        let request = GetParameterRequest::ciphertext("/a");

        let first = cached
            .get_parameter(&request, RequestOptions::cached())
            .await
            .unwrap();
        let second = cached
            .get_parameter(&request, RequestOptions::cached())
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(stub.calls(), 1);
        assert_eq!(cached.cached_len(), 1);
    }

    #[tokio::test]
    async fn uncached_request_always_hits_inner() {
        let stub = Arc::new(StubStore::new().with_parameter("/a", "c", "arn"));
        let cached = CachedRequester::new(stub.clone());
        let request = GetParameterRequest::ciphertext("/a");

        for _ in 0..2 {
            cached
                .get_parameter(&request, RequestOptions::default())
                .await
                .unwrap();
        }

        assert_eq!(stub.calls(), 2);
        assert_eq!(cached.cached_len(), 0);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let stub = Arc::new(StubStore::new().with_failure("/a", 500, "boom"));
        let cached = CachedRequester::new(stub.clone());
        let request = GetParameterRequest::ciphertext("/a");

        for _ in 0..2 {
            let err = cached
                .get_parameter(&request, RequestOptions::cached())
                .await
                .unwrap_err();
            assert_eq!(err.status_code, 500);
        }

        assert_eq!(stub.calls(), 2);
    }

    #[tokio::test]
    async fn cache_key_includes_decryption_flag() {
        let stub = Arc::new(StubStore::new().with_parameter("/a", "c", "arn"));
        let cached = CachedRequester::new(stub.clone());
        let encrypted = GetParameterRequest::ciphertext("/a");
        let decrypted = GetParameterRequest {
            with_decryption: true,
            ..encrypted.clone()
        };

        cached
            .get_parameter(&encrypted, RequestOptions::cached())
            .await
            .unwrap();
        cached
            .get_parameter(&decrypted, RequestOptions::cached())
            .await
            .unwrap();

        assert_eq!(stub.calls(), 2);
    }
}
