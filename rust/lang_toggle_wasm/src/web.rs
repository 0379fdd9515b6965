// Browser bindings: localStorage, document.cookie and the live DOM

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::Array;
use log::LevelFilter;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    Document, Element, Event, HtmlDocument, KeyboardEvent, MutationObserver,
    MutationObserverInit, MutationRecord, Node, Storage,
};

use crate::config::I18nConfig;
use crate::console_log;
use crate::controller::{is_activation_key, LanguageController};
use crate::language::Language;
use crate::page::Page;
use crate::persist::{CookieJar, PreferenceStore};
use crate::selector::Selector;

struct LocalStorage {
    storage: Option<Storage>,
}

impl PreferenceStore for LocalStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.as_ref()?.get_item(key).ok().flatten()
    }

    fn set(&mut self, key: &str, value: &str) {
        if let Some(storage) = &self.storage {
            let _ = storage.set_item(key, value);
        }
    }
}

struct DocumentCookies {
    document: HtmlDocument,
}

impl CookieJar for DocumentCookies {
    fn cookie_header(&self) -> String {
        self.document.cookie().unwrap_or_default()
    }

    fn set_cookie(&mut self, cookie: &str) {
        let _ = self.document.set_cookie(cookie);
    }
}

pub struct WebPage {
    document: Document,
}

impl Page for WebPage {
    type Node = Element;

    fn root(&self) -> Option<Element> {
        self.document.document_element()
    }

    fn body(&self) -> Option<Element> {
        self.document.body().map(Element::from)
    }

    fn element_by_id(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    fn select_first(&self, scope: Option<&Element>, selector: &Selector) -> Option<Element> {
        let found = match scope {
            Some(el) => el.query_selector(selector.as_str()),
            None => self.document.query_selector(selector.as_str()),
        };
        found.ok().flatten()
    }

    fn select_all(&self, scope: Option<&Element>, selector: &Selector) -> Vec<Element> {
        let list = match scope {
            Some(el) => el.query_selector_all(selector.as_str()),
            None => self.document.query_selector_all(selector.as_str()),
        };
        let Ok(list) = list else {
            return Vec::new();
        };
        (0..list.length())
            .filter_map(|i| list.item(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }

    fn matches(&self, node: &Element, selector: &Selector) -> bool {
        node.matches(selector.as_str()).unwrap_or(false)
    }

    fn attr(&self, node: &Element, name: &str) -> Option<String> {
        node.get_attribute(name)
    }

    fn set_attr(&mut self, node: &Element, name: &str, value: &str) {
        let _ = node.set_attribute(name, value);
    }

    fn remove_attr(&mut self, node: &Element, name: &str) {
        let _ = node.remove_attribute(name);
    }

    fn set_text(&mut self, node: &Element, text: &str) {
        node.set_text_content(Some(text));
    }

    fn create_element(&mut self, tag: &str) -> Option<Element> {
        self.document.create_element(tag).ok()
    }

    fn append_child(&mut self, parent: &Element, child: &Element) {
        let _ = parent.append_child(child);
    }
}

type WebController = LanguageController<LocalStorage, DocumentCookies, WebPage>;

/// Handle returned to the page and published as `window.i18n`.
#[wasm_bindgen]
#[derive(Clone)]
pub struct I18n {
    controller: Rc<RefCell<WebController>>,
}

#[wasm_bindgen]
impl I18n {
    #[wasm_bindgen(js_name = getCurrentLanguage)]
    pub fn get_current_language(&self) -> String {
        self.controller.borrow().current_language().code().to_string()
    }

    #[wasm_bindgen(js_name = setLanguage)]
    pub fn set_language(&self, code: &str) -> Result<(), JsValue> {
        let lang = Language::parse(code)
            .ok_or_else(|| JsValue::from_str(&format!("unsupported language: {code}")))?;
        self.controller.borrow_mut().set_language(lang);
        Ok(())
    }

    #[wasm_bindgen(js_name = toggleLanguage)]
    pub fn toggle_language(&self) -> String {
        self.controller.borrow_mut().toggle().code().to_string()
    }

    #[wasm_bindgen(js_name = getAvailableLanguages)]
    pub fn get_available_languages(&self) -> Array {
        self.controller
            .borrow()
            .available_languages()
            .iter()
            .map(|lang| JsValue::from_str(lang.code()))
            .collect()
    }

    #[wasm_bindgen(js_name = isRtlCssEnabled)]
    pub fn is_rtl_css_enabled(&self) -> bool {
        self.controller.borrow().is_rtl_css_enabled()
    }
}

fn targets(event: &Event, selector: &str) -> bool {
    event
        .target()
        .and_then(|target| target.dyn_into::<Element>().ok())
        .and_then(|el| el.closest(selector).ok().flatten())
        .is_some()
}

// Listeners sit on the document so a toggle injected later works too.
fn attach_activation(document: &Document, controller: &Rc<RefCell<WebController>>) -> Result<(), JsValue> {
    let selector = Selector::id(&controller.borrow().config().toggle_id).to_string();

    let on_click = {
        let controller = controller.clone();
        let selector = selector.clone();
        Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            if targets(&event, &selector) {
                controller.borrow_mut().toggle();
            }
        })
    };
    document.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
    on_click.forget();

    let on_key = {
        let controller = controller.clone();
        Closure::<dyn FnMut(KeyboardEvent)>::new(move |event: KeyboardEvent| {
            if is_activation_key(&event.key()) && targets(&event, &selector) {
                event.prevent_default();
                controller.borrow_mut().toggle();
            }
        })
    };
    document.add_event_listener_with_callback("keydown", on_key.as_ref().unchecked_ref())?;
    on_key.forget();
    Ok(())
}

fn watch_containers(document: &Document, controller: &Rc<RefCell<WebController>>) -> Result<(), JsValue> {
    let Some(body) = document.body() else {
        return Ok(());
    };
    let controller = controller.clone();
    let on_mutation = Closure::<dyn FnMut(Array, MutationObserver)>::new(
        move |records: Array, _observer: MutationObserver| {
            let mut added = Vec::new();
            for record in records.iter() {
                let Ok(record) = record.dyn_into::<MutationRecord>() else {
                    continue;
                };
                let nodes = record.added_nodes();
                for i in 0..nodes.length() {
                    let Some(node) = nodes.item(i) else {
                        continue;
                    };
                    if node.node_type() != Node::ELEMENT_NODE {
                        continue;
                    }
                    if let Ok(el) = node.dyn_into::<Element>() {
                        added.push(el);
                    }
                }
            }
            if added.is_empty() {
                return;
            }
            if let Ok(mut controller) = controller.try_borrow_mut() {
                controller.on_nodes_added(&added);
            }
        },
    );
    let observer = MutationObserver::new(on_mutation.as_ref().unchecked_ref())?;
    let mut options = MutationObserverInit::new();
    options.child_list(true);
    options.subtree(true);
    observer.observe_with_options(&body, &options)?;
    on_mutation.forget();
    Ok(())
}

fn boot(document: &Document, controller: &Rc<RefCell<WebController>>) -> Result<(), JsValue> {
    let lang = controller.borrow_mut().init();
    log::debug!("initial language {}", lang.code());
    attach_activation(document, controller)?;
    watch_containers(document, controller)
}

/// Starts the controller once the DOM is ready and publishes `window.i18n`.
/// `config` may be `undefined` to keep the site defaults.
#[wasm_bindgen(js_name = startI18n)]
pub fn start_i18n(config: JsValue) -> Result<I18n, JsValue> {
    console_log::init(LevelFilter::Info);

    let config: I18nConfig = if config.is_undefined() || config.is_null() {
        I18nConfig::default()
    } else {
        serde_wasm_bindgen::from_value(config)?
    };
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let cookies = DocumentCookies {
        document: document.clone().dyn_into::<HtmlDocument>()?,
    };
    let store = LocalStorage {
        storage: window.local_storage().ok().flatten(),
    };
    let page = WebPage {
        document: document.clone(),
    };
    let controller = LanguageController::new(config, store, cookies, page)
        .map_err(|err| JsValue::from_str(&err.to_string()))?
        .with_browser_language(window.navigator().language());
    let controller = Rc::new(RefCell::new(controller));

    if document.ready_state() == "loading" {
        let ready_document = document.clone();
        let ready_controller = controller.clone();
        let on_ready = Closure::once_into_js(move || {
            if let Err(err) = boot(&ready_document, &ready_controller) {
                log::warn!("language switcher failed to start: {err:?}");
            }
        });
        document.add_event_listener_with_callback("DOMContentLoaded", on_ready.unchecked_ref())?;
    } else {
        boot(&document, &controller)?;
    }

    let handle = I18n { controller };
    js_sys::Reflect::set(&window, &JsValue::from_str("i18n"), &JsValue::from(handle.clone()))?;
    Ok(handle)
}
