//! Bilingual (English/Persian) language switching for the portfolio pages.
//!
//! `LanguageController` resolves the visitor's language from storage, cookie
//! and browser preference, rewrites the document for it and keeps every
//! stored copy of the preference in sync. The document is reached through
//! the `Page` trait: `web::WebPage` in the browser, `StaticPage` natively.

mod config;
mod controller;
mod escape;
mod language;
mod page;
mod persist;
mod repair;
mod selector;
mod static_page;

#[cfg(target_arch = "wasm32")]
mod console_log;
#[cfg(target_arch = "wasm32")]
mod web;

pub use config::I18nConfig;
pub use controller::{is_activation_key, LanguageController};
pub use language::{Direction, Language};
pub use page::Page;
pub use persist::{
    cookie_language, preference_cookie, resolve_language, CookieJar, MemoryCookieJar,
    MemoryStore, PreferenceStore,
};
pub use repair::{is_corrupt, repaired_secondary};
pub use selector::{Selector, SelectorError};
pub use static_page::{NodeId, StaticPage};
