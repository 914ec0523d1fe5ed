//! Answer Module
//!
//! The Request → Response contract every tier satisfies.
//!
//! ## Answerers
//! - [`Origin`]: authoritative, backed by an [`OriginStore`]
//! - [`CacheTier`](crate::cache::CacheTier): surrogate that may short-circuit
//!   before reaching an upstream answerer
//!
//! The server loop and the tests only ever depend on [`Answer`], never on
//! which variant produced a response.

use std::sync::Arc;

use crate::error::Result;
use crate::protocol::{Request, Response};
use crate::store::OriginStore;

/// Something that can answer a lookup request
///
/// Implementations must echo `request.key` in the response and must be safe
/// to call from several worker threads at once.
pub trait Answer: Send + Sync {
    fn answer(&self, request: &Request) -> Result<Response>;

    /// Answer without leaving the process, or `None` if that is not possible
    ///
    /// A pooled server calls this on its receive thread and only hands
    /// requests that return `None` to the workers.
    fn answer_local(&self, _request: &Request) -> Option<Response> {
        None
    }
}

impl<A: Answer + ?Sized> Answer for Arc<A> {
    fn answer(&self, request: &Request) -> Result<Response> {
        (**self).answer(request)
    }

    fn answer_local(&self, request: &Request) -> Option<Response> {
        (**self).answer_local(request)
    }
}

impl<A: Answer + ?Sized> Answer for Box<A> {
    fn answer(&self, request: &Request) -> Result<Response> {
        (**self).answer(request)
    }

    fn answer_local(&self, request: &Request) -> Option<Response> {
        (**self).answer_local(request)
    }
}

/// The origin answerer
///
/// Stateless per request: the response depends only on the key and the
/// immutable store.
#[derive(Debug, Clone)]
pub struct Origin {
    store: Arc<OriginStore>,
}

impl Origin {
    pub fn new(store: OriginStore) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Resolve a request against the store
    pub fn resolve(&self, request: &Request) -> Response {
        Response::from_lookup(request.key, self.store.lookup(request.key))
    }
}

impl Answer for Origin {
    fn answer(&self, request: &Request) -> Result<Response> {
        Ok(self.resolve(request))
    }
}
