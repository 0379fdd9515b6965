// Backends the worker talks to. The browser implementation lives in `sw`,
// the in-memory one in `memory`.

use crate::error::CacheError;
use crate::request::RequestInfo;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseKind {
    Basic,
    Cors,
    Opaque,
    Other,
}

pub trait CachedResponse: Sized {
    fn status(&self) -> u16;

    fn kind(&self) -> ResponseKind;

    /// Independent copy whose body can be consumed separately from `self`.
    fn try_clone(&self) -> Result<Self, CacheError>;

    /// Only complete same-origin responses are stored opportunistically.
    fn is_cacheable(&self) -> bool {
        self.status() == 200 && self.kind() == ResponseKind::Basic
    }
}

/// Named cache generations, each mapping request URLs to responses.
#[allow(async_fn_in_trait)]
pub trait CacheStore {
    type Response: CachedResponse;

    async fn keys(&self) -> Result<Vec<String>, CacheError>;

    /// Creates the generation if it does not exist yet.
    async fn open(&self, generation: &str) -> Result<(), CacheError>;

    async fn has(&self, generation: &str) -> Result<bool, CacheError>;

    async fn delete(&self, generation: &str) -> Result<bool, CacheError>;

    /// Fetches and stores every URL as one batch; nothing is stored if any fetch fails.
    async fn add_all(&self, generation: &str, urls: &[String]) -> Result<(), CacheError>;

    /// Must not create the generation as a side effect.
    async fn lookup(
        &self,
        generation: &str,
        url: &str,
    ) -> Result<Option<Self::Response>, CacheError>;

    async fn put(
        &self,
        generation: &str,
        url: &str,
        response: Self::Response,
    ) -> Result<(), CacheError>;
}

#[allow(async_fn_in_trait)]
pub trait Network {
    type Response;

    async fn fetch(&self, request: &RequestInfo) -> Result<Self::Response, CacheError>;
}
