// Where the language preference lives: durable storage and a cookie

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::language::Language;

/// Durable key/value storage (`localStorage` in the browser).
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: &str, value: &str);
}

/// Cookie access with `document.cookie` semantics: reads return the whole
/// `name=value; name2=value2` header, writes take one `Set-Cookie`-style line.
pub trait CookieJar {
    fn cookie_header(&self) -> String;

    fn set_cookie(&mut self, cookie: &str);
}

/// Cookie line persisting `lang` site-wide.
pub fn preference_cookie(name: &str, lang: Language, max_age: u64) -> String {
    format!("{name}={}; Path=/; Max-Age={max_age}; SameSite=Lax", lang.code())
}

/// First cookie named `name` whose value is exactly one of the known codes.
/// Stale or empty duplicates (e.g. a path-scoped `lang=`) are skipped.
pub fn cookie_language(header: &str, name: &str) -> Option<Language> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .filter(|(key, _)| *key == name)
        .find_map(|(_, value)| Language::parse(value.trim()))
}

/// Priority: durable storage, cookie, browser language, then the primary language.
/// Unrecognised values fall through to the next source.
pub fn resolve_language(
    stored: Option<&str>,
    cookie: Option<Language>,
    browser: Option<&str>,
) -> Language {
    stored
        .and_then(Language::parse)
        .or(cookie)
        .or_else(|| browser.and_then(Language::from_browser_tag))
        .unwrap_or(Language::PRIMARY)
}

/// Shared in-memory storage; clones see the same values, which lets tests
/// simulate a page reload by building a second controller.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    values: Rc<RefCell<HashMap<String, String>>>,
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }
}

#[derive(Clone, Debug, Default)]
pub struct MemoryCookieJar {
    cookies: Rc<RefCell<Vec<(String, String)>>>,
}

impl CookieJar for MemoryCookieJar {
    fn cookie_header(&self) -> String {
        self.cookies
            .borrow()
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn set_cookie(&mut self, cookie: &str) {
        let mut parts = cookie.split(';');
        let Some((name, value)) = parts.next().and_then(|p| p.trim().split_once('=')) else {
            return;
        };
        let expired = parts.any(|attr| attr.trim().eq_ignore_ascii_case("max-age=0"));
        let mut cookies = self.cookies.borrow_mut();
        cookies.retain(|(k, _)| k != name);
        if !expired {
            cookies.push((name.to_string(), value.to_string()));
        }
    }
}
