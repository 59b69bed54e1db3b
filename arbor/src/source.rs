//! Lazy children sources.
//!
//! A [`ChildrenSource`] supplies the children of a node whose children array
//! is not resident yet. The tree calls it at most once per node while a
//! request is in flight.

use std::future::Future;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;
use thiserror::Error;

/// Error type for children fetch failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FetchError {
    /// Error message
    pub message: String,
}

impl FetchError {
    /// Create a new fetch error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for FetchError {
    fn from(err: std::io::Error) -> Self {
        Self::new(err.to_string())
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(err.to_string())
    }
}

impl From<String> for FetchError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for FetchError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Result of a children request. `Ok(None)` and `Ok(Some(vec![]))` both mean
/// the node has no children.
pub type FetchResult = Result<Option<Vec<Value>>, FetchError>;

/// Provider of children for nodes that don't carry them yet.
///
/// Implementations own their transport and timeouts; the tree never cancels
/// or retries a request on its own.
#[async_trait]
pub trait ChildrenSource: Send + Sync {
    /// Request the children of `node`, which sits at `depth` (children of the
    /// tree root are depth 0).
    ///
    /// `node` is a snapshot taken when the request was issued.
    async fn request_children(&self, node: Value, depth: usize) -> FetchResult;
}

/// A [`ChildrenSource`] backed by an async closure. See [`source_fn`].
pub struct FnSource<F> {
    f: F,
}

impl<F> std::fmt::Debug for FnSource<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnSource").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F> ChildrenSource for FnSource<F>
where
    F: Fn(Value, usize) -> BoxFuture<'static, FetchResult> + Send + Sync,
{
    async fn request_children(&self, node: Value, depth: usize) -> FetchResult {
        (self.f)(node, depth).await
    }
}

/// Wraps an async closure as a [`ChildrenSource`].
///
/// # Example
///
/// ```
/// use arbor::source::{source_fn, ChildrenSource};
/// use serde_json::json;
///
/// let source = source_fn(|node, _depth| async move {
///     let parent = node["value"].as_str().unwrap_or_default().to_string();
///     Ok(Some(vec![json!({"label": "child", "value": format!("{parent}/child")})]))
/// });
/// # let _ = &source as &dyn ChildrenSource;
/// ```
pub fn source_fn<F, Fut>(
    f: F,
) -> FnSource<impl Fn(Value, usize) -> BoxFuture<'static, FetchResult> + Send + Sync>
where
    F: Fn(Value, usize) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = FetchResult> + Send + 'static,
{
    FnSource {
        f: move |node: Value, depth: usize| -> BoxFuture<'static, FetchResult> {
            Box::pin(f(node, depth))
        },
    }
}
