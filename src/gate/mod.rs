mod guard;
mod response;

use async_trait::async_trait;

pub use guard::{DenyMessage, Guard, DEFAULT_DENY_MESSAGE};
pub use response::Response;

/// Identifies the caller of a request.
pub trait RequestKey {
    /// Returns the key to look up in the blacklist, if the caller can be identified.
    fn request_key(&self) -> Option<String>;
}

/// Turns a request into a response.
#[async_trait]
pub trait Handler<R>: Send + Sync
where
    R: Send + 'static,
{
    async fn handle(&self, request: R) -> anyhow::Result<Response>;
}

/// Produces the response sent to blocked callers instead of the normal one.
#[async_trait]
pub trait DenyResponder<R>: Send + Sync
where
    R: Send + 'static,
{
    async fn deny(&self, request: R) -> anyhow::Result<Response>;
}
