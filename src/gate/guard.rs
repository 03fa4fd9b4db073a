use std::sync::Arc;

use async_trait::async_trait;
use log::debug;

use crate::blacklist::{Clock, IpBlacklist, SystemClock};

use super::{DenyResponder, Handler, RequestKey, Response};

pub const DEFAULT_DENY_MESSAGE: &str = "You're Not Allowed to Visit!";

/// Deny responder answering with a fixed `200 OK` body.
#[derive(Debug, Clone)]
pub struct DenyMessage {
    body: String,
}

impl DenyMessage {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }
}

impl Default for DenyMessage {
    fn default() -> Self {
        Self::new(DEFAULT_DENY_MESSAGE)
    }
}

#[async_trait]
impl<R> DenyResponder<R> for DenyMessage
where
    R: Send + 'static,
{
    async fn deny(&self, _request: R) -> anyhow::Result<Response> {
        Ok(Response::ok(self.body.clone()))
    }
}

/// Middleware that turns away blacklisted callers.
///
/// Requests whose key is in the blacklist go to the deny responder, all
/// other requests (including ones without a key) are forwarded unchanged.
pub struct Guard<H, D = DenyMessage, C: Clock = SystemClock> {
    blacklist: Arc<IpBlacklist<C>>,
    next: H,
    responder: D,
}

impl<H, C: Clock> Guard<H, DenyMessage, C> {
    pub fn new(blacklist: Arc<IpBlacklist<C>>, next: H) -> Self {
        Self {
            blacklist,
            next,
            responder: DenyMessage::default(),
        }
    }
}

impl<H, D, C: Clock> Guard<H, D, C> {
    pub fn with_responder<E>(self, responder: E) -> Guard<H, E, C> {
        Guard {
            blacklist: self.blacklist,
            next: self.next,
            responder,
        }
    }

    pub fn blacklist(&self) -> &Arc<IpBlacklist<C>> {
        &self.blacklist
    }
}

#[async_trait]
impl<R, H, D, C> Handler<R> for Guard<H, D, C>
where
    R: RequestKey + Send + 'static,
    H: Handler<R>,
    D: DenyResponder<R>,
    C: Clock,
{
    async fn handle(&self, request: R) -> anyhow::Result<Response> {
        if let Some(key) = request.request_key() {
            if self.blacklist.contains(&key) {
                debug!("Denied request from blocked caller {}", key);
                return self.responder.deny(request).await;
            }
        }
        self.next.handle(request).await
    }
}
