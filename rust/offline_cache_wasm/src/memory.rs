//! In-memory cache store and scripted network, for hosts without the Cache
//! Storage API and for exercising the worker natively.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};

use crate::error::CacheError;
use crate::request::RequestInfo;
use crate::store::{CacheStore, CachedResponse, Network, ResponseKind};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemoryResponse {
    pub status: u16,
    pub kind: ResponseKind,
    pub body: String,
}

impl MemoryResponse {
    pub fn ok(body: &str) -> Self {
        Self {
            status: 200,
            kind: ResponseKind::Basic,
            body: body.to_string(),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn with_kind(mut self, kind: ResponseKind) -> Self {
        self.kind = kind;
        self
    }
}

impl CachedResponse for MemoryResponse {
    fn status(&self) -> u16 {
        self.status
    }

    fn kind(&self) -> ResponseKind {
        self.kind
    }

    fn try_clone(&self) -> Result<Self, CacheError> {
        Ok(self.clone())
    }
}

#[derive(Default)]
pub struct MemoryCacheStore {
    generations: RefCell<BTreeMap<String, BTreeMap<String, MemoryResponse>>>,
    /// What `add_all` downloads from.
    origin: HashMap<String, MemoryResponse>,
    reject_puts: Cell<bool>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_origin_asset(mut self, url: &str, response: MemoryResponse) -> Self {
        self.origin.insert(url.to_string(), response);
        self
    }

    /// Stores an entry directly, creating the generation if needed.
    pub fn seed(&self, generation: &str, url: &str, response: MemoryResponse) {
        self.generations
            .borrow_mut()
            .entry(generation.to_string())
            .or_default()
            .insert(url.to_string(), response);
    }

    pub fn entries(&self, generation: &str) -> Option<Vec<String>> {
        self.generations
            .borrow()
            .get(generation)
            .map(|entries| entries.keys().cloned().collect())
    }

    pub fn reject_puts(&self, reject: bool) {
        self.reject_puts.set(reject);
    }
}

impl CacheStore for MemoryCacheStore {
    type Response = MemoryResponse;

    async fn keys(&self) -> Result<Vec<String>, CacheError> {
        Ok(self.generations.borrow().keys().cloned().collect())
    }

    async fn open(&self, generation: &str) -> Result<(), CacheError> {
        self.generations
            .borrow_mut()
            .entry(generation.to_string())
            .or_default();
        Ok(())
    }

    async fn has(&self, generation: &str) -> Result<bool, CacheError> {
        Ok(self.generations.borrow().contains_key(generation))
    }

    async fn delete(&self, generation: &str) -> Result<bool, CacheError> {
        Ok(self.generations.borrow_mut().remove(generation).is_some())
    }

    async fn add_all(&self, generation: &str, urls: &[String]) -> Result<(), CacheError> {
        let mut fetched = Vec::with_capacity(urls.len());
        for url in urls {
            match self.origin.get(url) {
                Some(response) if response.is_cacheable() => {
                    fetched.push((url.clone(), response.clone()))
                }
                _ => return Err(CacheError::Store(format!("failed to fetch {url}"))),
            }
        }
        self.generations
            .borrow_mut()
            .entry(generation.to_string())
            .or_default()
            .extend(fetched);
        Ok(())
    }

    async fn lookup(
        &self,
        generation: &str,
        url: &str,
    ) -> Result<Option<MemoryResponse>, CacheError> {
        Ok(self
            .generations
            .borrow()
            .get(generation)
            .and_then(|entries| entries.get(url).cloned()))
    }

    async fn put(
        &self,
        generation: &str,
        url: &str,
        response: MemoryResponse,
    ) -> Result<(), CacheError> {
        if self.reject_puts.get() {
            return Err(CacheError::Store("quota exceeded".to_string()));
        }
        self.seed(generation, url, response);
        Ok(())
    }
}

/// Network double that answers from a fixed table and records every call.
#[derive(Default)]
pub struct ScriptedNetwork {
    responses: HashMap<String, MemoryResponse>,
    offline: Cell<bool>,
    calls: RefCell<Vec<String>>,
}

impl ScriptedNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, url: &str, response: MemoryResponse) -> Self {
        self.responses.insert(url.to_string(), response);
        self
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.set(offline);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl Network for ScriptedNetwork {
    type Response = MemoryResponse;

    async fn fetch(&self, request: &RequestInfo) -> Result<MemoryResponse, CacheError> {
        self.calls.borrow_mut().push(request.url.clone());
        if self.offline.get() {
            return Err(CacheError::Network(format!("{} unreachable", request.url)));
        }
        Ok(self
            .responses
            .get(&request.url)
            .cloned()
            .unwrap_or_else(|| MemoryResponse::ok("").with_status(404)))
    }
}
