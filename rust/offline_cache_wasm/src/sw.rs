// wasm-bindgen entry point: binds the worker lifecycle to Cache Storage and fetch

use std::rc::Rc;

use js_sys::{Array, Promise};
use log::LevelFilter;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{future_to_promise, spawn_local, JsFuture};
use web_sys::{
    Cache, CacheStorage, ExtendableEvent, ExtendableMessageEvent, FetchEvent,
    CacheQueryOptions, Request, RequestDestination, Response, ResponseType,
    ServiceWorkerGlobalScope,
};

use crate::console_log;
use crate::error::CacheError;
use crate::manifest::CacheManifest;
use crate::message::ControlMessage;
use crate::request::{Destination, RequestInfo};
use crate::store::{CacheStore, CachedResponse, Network, ResponseKind};
use crate::worker::{OfflineCache, WorkerAction};

fn describe(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            value
                .dyn_ref::<js_sys::Error>()
                .map(|err| String::from(err.message()))
        })
        .unwrap_or_else(|| format!("{value:?}"))
}

fn store_err(value: JsValue) -> CacheError {
    CacheError::Store(describe(&value))
}

impl From<CacheError> for JsValue {
    fn from(err: CacheError) -> Self {
        js_sys::Error::new(&err.to_string()).into()
    }
}

impl CachedResponse for Response {
    fn status(&self) -> u16 {
        Response::status(self)
    }

    fn kind(&self) -> ResponseKind {
        match self.type_() {
            ResponseType::Basic => ResponseKind::Basic,
            ResponseType::Cors => ResponseKind::Cors,
            ResponseType::Opaque | ResponseType::Opaqueredirect => ResponseKind::Opaque,
            _ => ResponseKind::Other,
        }
    }

    fn try_clone(&self) -> Result<Self, CacheError> {
        Response::clone(self).map_err(|err| CacheError::Clone(describe(&err)))
    }
}

struct BrowserCacheStore {
    caches: CacheStorage,
}

impl BrowserCacheStore {
    async fn cache(&self, generation: &str) -> Result<Cache, CacheError> {
        let value = JsFuture::from(self.caches.open(generation))
            .await
            .map_err(store_err)?;
        value.dyn_into::<Cache>().map_err(store_err)
    }
}

impl CacheStore for BrowserCacheStore {
    type Response = Response;

    async fn keys(&self) -> Result<Vec<String>, CacheError> {
        let value = JsFuture::from(self.caches.keys()).await.map_err(store_err)?;
        Ok(Array::from(&value)
            .iter()
            .filter_map(|name| name.as_string())
            .collect())
    }

    async fn open(&self, generation: &str) -> Result<(), CacheError> {
        self.cache(generation).await.map(|_| ())
    }

    async fn has(&self, generation: &str) -> Result<bool, CacheError> {
        let value = JsFuture::from(self.caches.has(generation))
            .await
            .map_err(store_err)?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn delete(&self, generation: &str) -> Result<bool, CacheError> {
        let value = JsFuture::from(self.caches.delete(generation))
            .await
            .map_err(store_err)?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn add_all(&self, generation: &str, urls: &[String]) -> Result<(), CacheError> {
        let cache = self.cache(generation).await?;
        let list: Array = urls.iter().map(|url| JsValue::from_str(url)).collect();
        JsFuture::from(cache.add_all_with_str_sequence(&list))
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn lookup(&self, generation: &str, url: &str) -> Result<Option<Response>, CacheError> {
        // caches.match with a cacheName never creates the generation
        let mut options = CacheQueryOptions::new();
        options.cache_name(generation);
        let value = JsFuture::from(self.caches.match_with_str_and_options(url, &options))
            .await
            .map_err(store_err)?;
        if value.is_undefined() || value.is_null() {
            return Ok(None);
        }
        value.dyn_into::<Response>().map(Some).map_err(store_err)
    }

    async fn put(&self, generation: &str, url: &str, response: Response) -> Result<(), CacheError> {
        let cache = self.cache(generation).await?;
        JsFuture::from(cache.put_with_str(url, &response))
            .await
            .map_err(store_err)?;
        Ok(())
    }
}

/// Fetches the original request object so headers and credentials survive.
struct WorkerNetwork {
    scope: ServiceWorkerGlobalScope,
    request: Request,
}

impl Network for WorkerNetwork {
    type Response = Response;

    async fn fetch(&self, _request: &RequestInfo) -> Result<Response, CacheError> {
        let value = JsFuture::from(self.scope.fetch_with_request(&self.request))
            .await
            .map_err(|err| CacheError::Network(describe(&err)))?;
        value
            .dyn_into::<Response>()
            .map_err(|err| CacheError::Network(describe(&err)))
    }
}

fn request_info(request: &Request) -> RequestInfo {
    let destination = match request.destination() {
        RequestDestination::Document => Destination::Document,
        _ => Destination::Other,
    };
    RequestInfo {
        method: request.method(),
        url: request.url(),
        destination,
    }
}

fn skip_waiting(scope: &ServiceWorkerGlobalScope) {
    if let Err(err) = scope.skip_waiting() {
        log::warn!("skipWaiting failed: {}", describe(&err));
    }
}

/// Registers install, activate, fetch and message handlers on the worker
/// global. `manifest` may be `undefined` to use the built-in asset list.
#[wasm_bindgen]
pub fn start_service_worker(manifest: JsValue) -> Result<(), JsValue> {
    console_log::init(LevelFilter::Info);

    let manifest: CacheManifest = if manifest.is_undefined() || manifest.is_null() {
        CacheManifest::default()
    } else {
        serde_wasm_bindgen::from_value(manifest)?
    };
    let scope: ServiceWorkerGlobalScope = js_sys::global().dyn_into()?;
    let store = BrowserCacheStore {
        caches: scope.caches()?,
    };
    let worker = Rc::new(OfflineCache::new(manifest, store, &scope.location().href()));

    let on_install = {
        let worker = worker.clone();
        let scope = scope.clone();
        Closure::<dyn FnMut(ExtendableEvent)>::new(move |event: ExtendableEvent| {
            let worker = worker.clone();
            let work = future_to_promise(async move {
                worker.install().await;
                Ok(JsValue::UNDEFINED)
            });
            if let Err(err) = event.wait_until(&work) {
                log::warn!("install waitUntil failed: {}", describe(&err));
            }
            skip_waiting(&scope);
        })
    };
    scope.set_oninstall(Some(on_install.as_ref().unchecked_ref()));
    on_install.forget();

    let on_activate = {
        let worker = worker.clone();
        let scope = scope.clone();
        Closure::<dyn FnMut(ExtendableEvent)>::new(move |event: ExtendableEvent| {
            let worker = worker.clone();
            let scope = scope.clone();
            let work = future_to_promise(async move {
                worker.activate().await;
                JsFuture::from(scope.clients().claim()).await?;
                Ok(JsValue::UNDEFINED)
            });
            if let Err(err) = event.wait_until(&work) {
                log::warn!("activate waitUntil failed: {}", describe(&err));
            }
        })
    };
    scope.set_onactivate(Some(on_activate.as_ref().unchecked_ref()));
    on_activate.forget();

    let on_fetch = {
        let worker = worker.clone();
        let scope = scope.clone();
        Closure::<dyn FnMut(FetchEvent)>::new(move |event: FetchEvent| {
            let request = event.request();
            let info = request_info(&request);
            if !worker.intercepts(&info) {
                return;
            }
            let worker = worker.clone();
            let network = WorkerNetwork {
                scope: scope.clone(),
                request,
            };
            let reply: Promise = future_to_promise(async move {
                let (response, write) = worker.respond(&info, &network).await?.into_parts();
                if let Some(write) = write {
                    spawn_local(async move {
                        worker.commit(write).await;
                    });
                }
                Ok(response.into())
            });
            if let Err(err) = event.respond_with(&reply) {
                log::warn!("respondWith failed for {}: {}", event.request().url(), describe(&err));
            }
        })
    };
    scope.set_onfetch(Some(on_fetch.as_ref().unchecked_ref()));
    on_fetch.forget();

    let on_message = {
        let scope = scope.clone();
        let worker = worker.clone();
        Closure::<dyn FnMut(ExtendableMessageEvent)>::new(move |event: ExtendableMessageEvent| {
            let Ok(message) = serde_wasm_bindgen::from_value::<ControlMessage>(event.data()) else {
                log::debug!("ignoring unrecognised message");
                return;
            };
            match worker.handle_message(message) {
                WorkerAction::SkipWaiting => skip_waiting(&scope),
                WorkerAction::Nothing => {}
            }
        })
    };
    scope.set_onmessage(Some(on_message.as_ref().unchecked_ref()));
    on_message.forget();

    Ok(())
}
