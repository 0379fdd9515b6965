// Service-worker lifecycle: install, activate and cache-first fetch handling

use std::cell::Cell;

use futures::future::join_all;

use crate::error::CacheError;
use crate::manifest::CacheManifest;
use crate::message::ControlMessage;
use crate::request::{is_same_origin, origin_of, resolve_url, Destination, RequestInfo};
use crate::store::{CacheStore, CachedResponse, Network};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkerPhase {
    Installing,
    Installed,
    Activating,
    Active,
}

/// A cache write deferred until after the response has been handed back.
#[derive(Debug)]
pub struct PendingWrite<R> {
    pub generation: String,
    pub key: String,
    pub response: R,
}

#[derive(Debug)]
pub enum Served<R> {
    Cached(R),
    Network {
        response: R,
        write: Option<PendingWrite<R>>,
    },
    /// Cached offline document returned in place of a failed navigation.
    OfflineFallback(R),
}

impl<R> Served<R> {
    pub fn into_parts(self) -> (R, Option<PendingWrite<R>>) {
        match self {
            Served::Cached(response) | Served::OfflineFallback(response) => (response, None),
            Served::Network { response, write } => (response, write),
        }
    }
}

/// What the binding should do in response to a control message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkerAction {
    SkipWaiting,
    Nothing,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteOutcome {
    Stored,
    /// The target generation no longer exists; the write was dropped.
    Discarded,
    Failed,
}

pub struct OfflineCache<S> {
    manifest: CacheManifest,
    store: S,
    scope: String,
    origin: String,
    phase: Cell<WorkerPhase>,
}

impl<S: CacheStore> OfflineCache<S> {
    /// `location` is the worker script URL. The manifest's `scope`, when
    /// set, is resolved against it and becomes the base for every entry.
    pub fn new(manifest: CacheManifest, store: S, location: &str) -> Self {
        let scope = if manifest.scope.is_empty() {
            location.to_string()
        } else {
            resolve_url(location, &manifest.scope).unwrap_or_else(|err| {
                log::warn!("ignoring cache scope {:?}: {err}", manifest.scope);
                location.to_string()
            })
        };
        let origin = origin_of(&scope).unwrap_or_default();
        Self {
            manifest,
            store,
            scope,
            origin,
            phase: Cell::new(WorkerPhase::Installing),
        }
    }

    pub fn cache_name(&self) -> String {
        self.manifest.cache_name()
    }

    pub fn phase(&self) -> WorkerPhase {
        self.phase.get()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Populates the current generation. A failed population is logged and
    /// does not fail the install; returns whether every asset was stored.
    pub async fn install(&self) -> bool {
        self.phase.set(WorkerPhase::Installing);
        let generation = self.cache_name();
        let populated = match self.populate(&generation).await {
            Ok(()) => true,
            Err(err) => {
                log::warn!("cache installation failed for {generation}: {err}");
                false
            }
        };
        self.phase.set(WorkerPhase::Installed);
        populated
    }

    async fn populate(&self, generation: &str) -> Result<(), CacheError> {
        let urls = self
            .manifest
            .precache_urls()
            .iter()
            .map(|url| resolve_url(&self.scope, url))
            .collect::<Result<Vec<_>, _>>()?;
        self.store.open(generation).await?;
        self.store.add_all(generation, &urls).await
    }

    /// Deletes every generation other than the current one and returns their
    /// names. All deletions finish before this returns, so the caller may
    /// claim clients afterwards.
    pub async fn activate(&self) -> Vec<String> {
        self.phase.set(WorkerPhase::Activating);
        let deleted = match self.purge_stale().await {
            Ok(deleted) => deleted,
            Err(err) => {
                log::warn!("could not enumerate cache generations: {err}");
                Vec::new()
            }
        };
        self.phase.set(WorkerPhase::Active);
        deleted
    }

    async fn purge_stale(&self) -> Result<Vec<String>, CacheError> {
        let current = self.cache_name();
        let stale: Vec<String> = self
            .store
            .keys()
            .await?
            .into_iter()
            .filter(|name| *name != current)
            .collect();

        let results = join_all(stale.iter().map(|name| self.store.delete(name))).await;

        let mut deleted = Vec::new();
        for (name, result) in stale.into_iter().zip(results) {
            match result {
                Ok(true) => {
                    log::info!("deleted stale cache generation {name}");
                    deleted.push(name);
                }
                Ok(false) => {}
                Err(err) => log::warn!("failed to delete cache generation {name}: {err}"),
            }
        }
        Ok(deleted)
    }

    /// Only same-origin GET requests are handled; everything else goes
    /// straight to the network untouched.
    pub fn intercepts(&self, request: &RequestInfo) -> bool {
        request.is_get() && is_same_origin(&request.url, &self.origin)
    }

    /// Cache-first response for an intercepted request.
    pub async fn respond<N>(
        &self,
        request: &RequestInfo,
        network: &N,
    ) -> Result<Served<S::Response>, CacheError>
    where
        N: Network<Response = S::Response>,
    {
        let generation = self.cache_name();
        match self.store.lookup(&generation, &request.url).await {
            Ok(Some(hit)) => return Ok(Served::Cached(hit)),
            Ok(None) => {}
            Err(err) => log::warn!("cache lookup failed for {}: {err}", request.url),
        }

        match network.fetch(request).await {
            Ok(response) => {
                if !response.is_cacheable() {
                    return Ok(Served::Network { response, write: None });
                }
                let write = match response.try_clone() {
                    Ok(copy) => Some(PendingWrite {
                        generation,
                        key: request.url.clone(),
                        response: copy,
                    }),
                    Err(err) => {
                        log::debug!("not caching {}: {err}", request.url);
                        None
                    }
                };
                Ok(Served::Network { response, write })
            }
            Err(err) if request.destination == Destination::Document => {
                log::debug!("navigation to {} failed offline: {err}", request.url);
                self.offline_document(&generation)
                    .await
                    .map(Served::OfflineFallback)
                    .ok_or_else(|| CacheError::Offline(request.url.clone()))
            }
            Err(err) => Err(err),
        }
    }

    async fn offline_document(&self, generation: &str) -> Option<S::Response> {
        let url = match resolve_url(&self.scope, &self.manifest.offline_document) {
            Ok(url) => url,
            Err(err) => {
                log::warn!("bad offline document {:?}: {err}", self.manifest.offline_document);
                return None;
            }
        };
        match self.store.lookup(generation, &url).await {
            Ok(found) => found,
            Err(err) => {
                log::warn!("offline document lookup failed: {err}");
                None
            }
        }
    }

    /// Maps a page message onto a worker action. A worker already known to
    /// be active has nothing left to skip.
    pub fn handle_message(&self, message: ControlMessage) -> WorkerAction {
        match message {
            ControlMessage::SkipWaiting if self.phase() == WorkerPhase::Active => {
                log::debug!("skip-waiting request ignored, already active");
                WorkerAction::Nothing
            }
            ControlMessage::SkipWaiting => WorkerAction::SkipWaiting,
        }
    }

    /// Stores a deferred write unless its generation has been deleted in the
    /// meantime. Failures are logged and never reach the fetch path.
    pub async fn commit(&self, write: PendingWrite<S::Response>) -> WriteOutcome {
        if write.generation != self.cache_name() {
            return WriteOutcome::Discarded;
        }
        match self.store.has(&write.generation).await {
            Ok(true) => {}
            Ok(false) => {
                log::debug!(
                    "dropping write of {} into deleted generation {}",
                    write.key,
                    write.generation
                );
                return WriteOutcome::Discarded;
            }
            Err(err) => {
                log::warn!("cache write of {} skipped: {err}", write.key);
                return WriteOutcome::Failed;
            }
        }
        match self
            .store
            .put(&write.generation, &write.key, write.response)
            .await
        {
            Ok(()) => WriteOutcome::Stored,
            Err(err) => {
                log::warn!("cache write of {} failed: {err}", write.key);
                WriteOutcome::Failed
            }
        }
    }
}
