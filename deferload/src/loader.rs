//! Loader and fetch abstractions.
//!
//! A loader is a zero-argument async action producing the loaded artifact.
//! Schedulers hold a [`SharedLoader`] so an explicit reload can invoke the
//! same action again; the prefetch queue consumes one-shot variants.
//!
//! Network fetching sits behind the [`ResourceFetcher`] trait so the rest
//! of the crate never talks to an HTTP client directly; [`HttpFetcher`] is
//! the production implementation, tests substitute mocks.

use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use futures::future::{BoxFuture, FutureExt};

use crate::error::LoadError;

/// Default request timeout for the HTTP fetcher.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// A pending load outcome.
pub type BoxLoadFuture<T> = BoxFuture<'static, Result<T, LoadError>>;

/// A reusable async load action.
///
/// Shared so a scheduler can re-invoke it on explicit reload; each call
/// produces a fresh future.
pub type SharedLoader<T> = Arc<dyn Fn() -> BoxLoadFuture<T> + Send + Sync>;

/// Wraps an async closure into a [`SharedLoader`].
///
/// # Example
///
/// ```
/// use deferload::loader::shared_loader;
///
/// let loader = shared_loader(|| async { Ok("image-bytes".to_string()) });
/// ```
pub fn shared_loader<T, F, Fut>(load: F) -> SharedLoader<T>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, LoadError>> + Send + 'static,
{
    Arc::new(move || load().boxed())
}

/// Asynchronously loads a resource by URL.
///
/// This abstraction allows dependency injection and easier testing by
/// substituting mock fetchers for the real HTTP client.
pub trait ResourceFetcher: Send + Sync {
    /// Fetches the resource at `url`.
    ///
    /// Returns the response body as bytes or a [`LoadError::Fetch`].
    fn fetch(&self, url: &str) -> BoxFuture<'static, Result<Bytes, LoadError>>;
}

/// Real fetcher implementation using reqwest.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Creates a fetcher with the default timeout.
    pub fn new() -> Result<Self, LoadError> {
        Self::with_timeout(DEFAULT_FETCH_TIMEOUT_SECS)
    }

    /// Creates a fetcher with a custom request timeout.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, LoadError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| LoadError::fetch(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new().expect("Failed to create default HTTP fetcher")
    }
}

impl ResourceFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> BoxFuture<'static, Result<Bytes, LoadError>> {
        let url = url.to_string();
        let request = self.client.get(&url);
        async move {
            let response = request
                .send()
                .await
                .map_err(|e| LoadError::fetch(format!("request failed: {}", e)))?;

            if !response.status().is_success() {
                return Err(LoadError::fetch(format!(
                    "HTTP {} from {}",
                    response.status(),
                    url
                )));
            }

            response
                .bytes()
                .await
                .map_err(|e| LoadError::fetch(format!("failed to read response: {}", e)))
        }
        .boxed()
    }
}
