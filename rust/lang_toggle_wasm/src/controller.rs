// Resolves, applies and persists the page language

use crate::config::I18nConfig;
use crate::language::Language;
use crate::page::Page;
use crate::persist::{cookie_language, preference_cookie, resolve_language, CookieJar, PreferenceStore};
use crate::repair::repaired_secondary;
use crate::selector::{Selector, SelectorError};

const CURRENT_CLASS: &str = "i18n-cur";
const SEPARATOR_CLASS: &str = "i18n-sep";
const ALTERNATE_CLASS: &str = "i18n-alt";

/// Keys that activate the toggle from the keyboard.
pub fn is_activation_key(key: &str) -> bool {
    matches!(key, " " | "Enter")
}

/// One per page session. Every language change goes through [`apply`],
/// which rewrites the document in place and persists the choice; there is
/// no reload.
///
/// [`apply`]: LanguageController::apply
pub struct LanguageController<S, C, P> {
    config: I18nConfig,
    store: S,
    cookies: C,
    page: P,
    browser_language: Option<String>,
    containers: Vec<Selector>,
    translatable: Selector,
    loader_text: Selector,
    toggle: Selector,
    current_label: Selector,
    alternate_label: Selector,
}

impl<S, C, P> LanguageController<S, C, P>
where
    S: PreferenceStore,
    C: CookieJar,
    P: Page,
{
    pub fn new(config: I18nConfig, store: S, cookies: C, page: P) -> Result<Self, SelectorError> {
        let containers = config
            .container_selectors
            .iter()
            .map(|s| Selector::parse(s))
            .collect::<Result<Vec<_>, _>>()?;
        let loader_text = Selector::parse(&config.loader_text_selector)?;
        Ok(Self {
            translatable: Selector::attr(&config.primary_attr),
            toggle: Selector::id(&config.toggle_id),
            current_label: Selector::class(CURRENT_CLASS),
            alternate_label: Selector::class(ALTERNATE_CLASS),
            containers,
            loader_text,
            config,
            store,
            cookies,
            page,
            browser_language: None,
        })
    }

    /// Language tag negotiated by the browser (`navigator.language`).
    pub fn with_browser_language(mut self, tag: Option<String>) -> Self {
        self.browser_language = tag;
        self
    }

    pub fn config(&self) -> &I18nConfig {
        &self.config
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn into_page(self) -> P {
        self.page
    }

    /// Preference from storage, cookie and browser, without touching anything.
    pub fn resolve(&self) -> Language {
        let stored = self.store.get(&self.config.storage_key);
        let cookie = cookie_language(&self.cookies.cookie_header(), &self.config.cookie_name);
        resolve_language(stored.as_deref(), cookie, self.browser_language.as_deref())
    }

    /// Language currently shown, read back from `<html lang>`.
    pub fn current_language(&self) -> Language {
        self.page
            .root()
            .and_then(|root| self.page.attr(&root, "lang"))
            .and_then(|code| Language::parse(&code))
            .unwrap_or(Language::PRIMARY)
    }

    pub fn available_languages(&self) -> [Language; 2] {
        Language::ALL
    }

    pub fn is_rtl_css_enabled(&self) -> bool {
        self.page
            .element_by_id(&self.config.rtl_stylesheet_id)
            .map(|link| self.page.attr(&link, "disabled").is_none())
            .unwrap_or(false)
    }

    pub fn apply(&mut self, lang: Language) {
        if let Some(root) = self.page.root() {
            self.page.set_attr(&root, "lang", lang.code());
            self.page.set_attr(&root, "dir", lang.direction().as_str());
        }
        self.apply_stylesheet(lang);
        self.apply_texts(lang);
        self.sync_toggle(lang);
        self.apply_loader(lang);
        self.persist(lang);
        log::debug!("language set to {}", lang.code());
    }

    pub fn set_language(&mut self, lang: Language) {
        self.apply(lang);
    }

    /// Switches to the other language and returns it.
    pub fn toggle(&mut self) -> Language {
        let next = self.current_language().other();
        self.apply(next);
        next
    }

    /// Resolves and applies the initial language, then makes sure a toggle exists.
    pub fn init(&mut self) -> Language {
        let lang = self.resolve();
        self.apply(lang);
        self.inject_toggle();
        lang
    }

    fn apply_stylesheet(&mut self, lang: Language) {
        let Some(link) = self.page.element_by_id(&self.config.rtl_stylesheet_id) else {
            return;
        };
        if lang.is_rtl() {
            self.page.remove_attr(&link, "disabled");
            self.page.set_attr(&link, "rel", "stylesheet");
        } else {
            self.page.set_attr(&link, "disabled", "");
            self.page.remove_attr(&link, "rel");
        }
    }

    fn apply_texts(&mut self, lang: Language) {
        let primary_attr = self.config.primary_attr.clone();
        let secondary_attr = self.config.secondary_attr.clone();
        for node in self.page.select_all(None, &self.translatable) {
            let Some(primary) = self.page.attr(&node, &primary_attr) else {
                continue;
            };
            let stored = self.page.attr(&node, &secondary_attr);
            let (secondary, repaired) = repaired_secondary(&primary, stored.as_deref());
            if repaired {
                log::debug!("repairing {secondary_attr} for {primary:?}");
                self.page.set_attr(&node, &secondary_attr, &secondary);
            }
            let text = if lang == Language::PRIMARY { primary } else { secondary };
            self.page.set_text(&node, &text);
        }
    }

    fn sync_toggle(&mut self, lang: Language) {
        let Some(button) = self.page.element_by_id(&self.config.toggle_id) else {
            return;
        };
        let pressed = lang == Language::SECONDARY;
        self.page.set_attr(&button, "aria-pressed", if pressed { "true" } else { "false" });
        self.page.set_attr(&button, "aria-label", lang.toggle_label());

        let current = self.page.select_first(Some(&button), &self.current_label);
        let alternate = self.page.select_first(Some(&button), &self.alternate_label);
        if let (Some(current), Some(alternate)) = (current, alternate) {
            self.page.set_text(&current, lang.abbrev());
            self.page.set_text(&alternate, lang.other().abbrev());
        }
    }

    fn apply_loader(&mut self, lang: Language) {
        let Some(loader) = self.page.element_by_id(&self.config.loader_id) else {
            return;
        };
        self.page.set_class(&loader, "rtl", lang.is_rtl());
        self.page.set_class(&loader, "ltr", !lang.is_rtl());
        if let Some(text) = self.page.select_first(Some(&loader), &self.loader_text) {
            self.page.set_text(&text, lang.loading_text());
        }
    }

    fn persist(&mut self, lang: Language) {
        self.store.set(&self.config.storage_key, lang.code());
        self.cookies.set_cookie(&preference_cookie(
            &self.config.cookie_name,
            lang,
            self.config.cookie_max_age,
        ));
    }

    /// Adds the toggle to the first candidate container (or `<body>`) unless
    /// one already exists. Returns whether a toggle was inserted.
    pub fn inject_toggle(&mut self) -> bool {
        if self.page.element_by_id(&self.config.toggle_id).is_some() {
            return false;
        }
        let parent = self
            .containers
            .iter()
            .find_map(|selector| self.page.select_first(None, selector))
            .or_else(|| self.page.body());
        let Some(parent) = parent else {
            log::debug!("no container for the language toggle");
            return false;
        };
        let Some(button) = self.build_toggle() else {
            return false;
        };
        self.page.append_child(&parent, &button);
        self.sync_toggle(self.current_language());
        true
    }

    fn build_toggle(&mut self) -> Option<P::Node> {
        let button = self.page.create_element("button")?;
        self.page.set_attr(&button, "id", &self.config.toggle_id);
        self.page.set_attr(&button, "class", "i18n-link");
        self.page.set_attr(&button, "type", "button");
        self.page.set_attr(&button, "aria-pressed", "false");
        self.page.set_attr(&button, "aria-label", "Switch language");

        // labels stay empty until synced with the active language
        for class in [CURRENT_CLASS, SEPARATOR_CLASS, ALTERNATE_CLASS] {
            let span = self.page.create_element("span")?;
            self.page.set_attr(&span, "class", class);
            if class == SEPARATOR_CLASS {
                self.page.set_attr(&span, "aria-hidden", "true");
                self.page.set_text(&span, " | ");
            }
            self.page.append_child(&button, &span);
        }
        Some(button)
    }

    /// Reaction to elements added after load: if any of them is, or contains,
    /// a candidate container without the toggle, injection runs again.
    pub fn on_nodes_added(&mut self, added: &[P::Node]) -> bool {
        let mut injected = false;
        for node in added {
            for container in self.containers_in(node) {
                if self.page.select_first(Some(&container), &self.toggle).is_none() {
                    injected |= self.inject_toggle();
                }
            }
        }
        injected
    }

    fn containers_in(&self, node: &P::Node) -> Vec<P::Node> {
        let mut found = Vec::new();
        if self.containers.iter().any(|s| self.page.matches(node, s)) {
            found.push(node.clone());
        }
        for selector in &self.containers {
            found.extend(self.page.select_all(Some(node), selector));
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::{MemoryCookieJar, MemoryStore};
    use crate::static_page::StaticPage;

    const PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head><link id="rtl-style" href="assets/css/rtl.css" disabled></head>
<body>
<div id="preloader"><span class="preloader-text"></span></div>
<header id="header"><nav class="navmenu"><a data-en="About" data-fa="درباره من">About</a></nav></header>
<h1 data-en="Hello" data-fa="سلام">Hello</h1>
</body>
</html>"#;

    type TestController = LanguageController<MemoryStore, MemoryCookieJar, StaticPage>;

    fn controller_for(html: &str, store: &MemoryStore, jar: &MemoryCookieJar) -> TestController {
        LanguageController::new(
            I18nConfig::default(),
            store.clone(),
            jar.clone(),
            StaticPage::parse(html),
        )
        .unwrap()
    }

    fn text_of(c: &TestController, selector: &str) -> String {
        let page = c.page();
        let node = page.select_first(None, &Selector::parse(selector).unwrap()).unwrap();
        page.text_content(node)
    }

    fn toggles(c: &TestController) -> usize {
        c.page().select_all(None, &Selector::id("lang-toggle")).len()
    }

    #[test]
    fn applied_language_survives_reload() {
        for lang in Language::ALL {
            let store = MemoryStore::default();
            let jar = MemoryCookieJar::default();
            controller_for(PAGE, &store, &jar).apply(lang);

            let reloaded = controller_for(PAGE, &store, &jar)
                .with_browser_language(Some("en-US".to_string()));
            assert_eq!(reloaded.resolve(), lang);
        }
    }

    #[test]
    fn cookie_alone_restores_preference() {
        let jar = MemoryCookieJar::default();
        controller_for(PAGE, &MemoryStore::default(), &jar).apply(Language::Fa);

        let fresh_storage = controller_for(PAGE, &MemoryStore::default(), &jar)
            .with_browser_language(Some("en-US".to_string()));
        assert_eq!(fresh_storage.resolve(), Language::Fa);
    }

    #[test]
    fn resolve_order_without_storage() {
        let c = controller_for(PAGE, &MemoryStore::default(), &MemoryCookieJar::default())
            .with_browser_language(Some("fa-IR".to_string()));
        assert_eq!(c.resolve(), Language::Fa);

        let c = controller_for(PAGE, &MemoryStore::default(), &MemoryCookieJar::default());
        assert_eq!(c.resolve(), Language::En);
    }

    #[test]
    fn apply_secondary_rewrites_document() {
        let mut c = controller_for(PAGE, &MemoryStore::default(), &MemoryCookieJar::default());
        c.init();
        c.apply(Language::Fa);

        let page = c.page();
        let root = page.root().unwrap();
        assert_eq!(page.attr(&root, "lang").as_deref(), Some("fa"));
        assert_eq!(page.attr(&root, "dir").as_deref(), Some("rtl"));
        assert_eq!(text_of(&c, "h1"), "سلام");
        assert_eq!(text_of(&c, "a"), "درباره من");
        assert_eq!(text_of(&c, ".preloader-text"), "در حال بارگذاری...");
        assert_eq!(text_of(&c, ".i18n-cur"), "FA");
        assert_eq!(text_of(&c, ".i18n-alt"), "EN");

        let loader = page.element_by_id("preloader").unwrap();
        assert!(page.has_class(&loader, "rtl"));
        assert!(!page.has_class(&loader, "ltr"));

        let button = page.element_by_id("lang-toggle").unwrap();
        assert_eq!(page.attr(&button, "aria-pressed").as_deref(), Some("true"));
        assert_eq!(page.attr(&button, "aria-label").as_deref(), Some("تغییر زبان به English"));
        assert!(c.is_rtl_css_enabled());
    }

    #[test]
    fn rtl_stylesheet_follows_language() {
        let mut c = controller_for(PAGE, &MemoryStore::default(), &MemoryCookieJar::default());
        c.apply(Language::Fa);
        let link = c.page().element_by_id("rtl-style").unwrap();
        assert_eq!(c.page().attr(&link, "rel").as_deref(), Some("stylesheet"));
        assert!(c.is_rtl_css_enabled());

        c.apply(Language::En);
        assert_eq!(c.page().attr(&link, "rel"), None);
        assert!(!c.is_rtl_css_enabled());
    }

    #[test]
    fn corrupted_translation_is_repaired() {
        let html = "<html><body><p data-en=\"Projects\" data-fa=\"\u{FFFD}\u{FFFD}\">x</p><p data-en=\"Contact\">y</p></body></html>";
        let mut c = controller_for(html, &MemoryStore::default(), &MemoryCookieJar::default());
        c.apply(Language::Fa);

        let page = c.page();
        let items = page.select_all(None, &Selector::parse("p").unwrap());
        assert_eq!(page.text_content(items[0]), "Projects");
        assert_eq!(page.attr(&items[0], "data-fa").as_deref(), Some("Projects"));
        assert_eq!(page.text_content(items[1]), "Contact");
        assert_eq!(page.attr(&items[1], "data-fa").as_deref(), Some("Contact"));
    }

    #[test]
    fn toggle_flips_and_persists() {
        let store = MemoryStore::default();
        let jar = MemoryCookieJar::default();
        let mut c = controller_for(PAGE, &store, &jar);
        assert_eq!(c.init(), Language::En);

        assert_eq!(c.toggle(), Language::Fa);
        assert_eq!(c.current_language(), Language::Fa);
        assert_eq!(store.get("lang").as_deref(), Some("fa"));
        assert_eq!(jar.cookie_header(), "lang=fa");

        // a double press settles on whichever ran last
        c.toggle();
        c.toggle();
        assert_eq!(c.current_language(), Language::Fa);
        assert_eq!(text_of(&c, "h1"), "سلام");
    }

    #[test]
    fn inject_toggle_is_idempotent() {
        let mut c = controller_for(PAGE, &MemoryStore::default(), &MemoryCookieJar::default());
        assert!(c.inject_toggle());
        assert!(!c.inject_toggle());
        assert_eq!(toggles(&c), 1);

        // first candidate in selector order wins: `nav` before `header`
        let button = c.page().element_by_id("lang-toggle").unwrap();
        let parent = c.page().parent(button).unwrap();
        assert_eq!(c.page().tag(parent), Some("nav"));
    }

    #[test]
    fn injected_toggle_shows_active_language() {
        let store = MemoryStore::default();
        store.clone().set("lang", "fa");
        let mut c = controller_for(PAGE, &store, &MemoryCookieJar::default());
        c.init();
        assert_eq!(text_of(&c, ".i18n-cur"), "FA");
        assert_eq!(text_of(&c, ".i18n-sep"), " | ");
        assert_eq!(text_of(&c, ".i18n-alt"), "EN");
    }

    #[test]
    fn toggle_falls_back_to_body() {
        let html = "<html><body><main><p>content</p></main></body></html>";
        let mut c = controller_for(html, &MemoryStore::default(), &MemoryCookieJar::default());
        assert!(c.inject_toggle());
        let button = c.page().element_by_id("lang-toggle").unwrap();
        let parent = c.page().parent(button).unwrap();
        assert_eq!(c.page().tag(parent), Some("body"));
    }

    #[test]
    fn existing_toggle_is_reused() {
        let html = r#"<html><body><nav><button id="lang-toggle"><span class="i18n-cur"></span><span class="i18n-alt"></span></button></nav></body></html>"#;
        let mut c = controller_for(html, &MemoryStore::default(), &MemoryCookieJar::default());
        c.init();
        assert_eq!(toggles(&c), 1);
        assert_eq!(text_of(&c, ".i18n-cur"), "EN");
        assert_eq!(text_of(&c, ".i18n-alt"), "FA");
    }

    #[test]
    fn late_navigation_gets_a_toggle() {
        let html = "<html><body><main></main></body></html>";
        let mut c = controller_for(html, &MemoryStore::default(), &MemoryCookieJar::default());
        c.init();
        assert_eq!(toggles(&c), 1);

        // drop the body fallback toggle to simulate a page that lost it
        let mut page = c.into_page();
        let body = page.body().unwrap();
        let button = page.element_by_id("lang-toggle").unwrap();
        let trash = page.create_element("div").unwrap();
        page.append_child(&trash, &button);
        let mut c = LanguageController::new(
            I18nConfig::default(),
            MemoryStore::default(),
            MemoryCookieJar::default(),
            page,
        )
        .unwrap();
        assert_eq!(toggles(&c), 0);

        let header = {
            let page = &mut c.page;
            let header = page.create_element("header").unwrap();
            page.append_child(&body, &header);
            header
        };
        assert!(c.on_nodes_added(&[header]));
        assert_eq!(toggles(&c), 1);
        let button = c.page().element_by_id("lang-toggle").unwrap();
        assert_eq!(c.page().parent(button), Some(header));

        // unrelated additions do nothing
        let p = c.page.create_element("p").unwrap();
        assert!(!c.on_nodes_added(&[p]));
        assert_eq!(toggles(&c), 1);
    }

    #[test]
    fn activation_keys() {
        assert!(is_activation_key(" "));
        assert!(is_activation_key("Enter"));
        assert!(!is_activation_key("Tab"));
        assert!(!is_activation_key("Spacebar"));
    }

    #[test]
    fn lists_available_languages() {
        let c = controller_for(PAGE, &MemoryStore::default(), &MemoryCookieJar::default());
        let codes: Vec<&str> = c.available_languages().iter().map(|l| l.code()).collect();
        assert_eq!(codes, vec!["fa", "en"]);
    }

    #[test]
    fn container_nested_in_added_node_gets_a_toggle() {
        let html = "<html><body><main></main></body></html>";
        let mut c = controller_for(html, &MemoryStore::default(), &MemoryCookieJar::default());
        assert_eq!(toggles(&c), 0);

        let (wrapper, nav) = {
            let page = &mut c.page;
            let body = page.body().unwrap();
            let wrapper = page.create_element("div").unwrap();
            let nav = page.create_element("nav").unwrap();
            page.append_child(&wrapper, &nav);
            page.append_child(&body, &wrapper);
            (wrapper, nav)
        };
        assert_eq!(c.containers_in(&wrapper), vec![nav]);

        assert!(c.on_nodes_added(&[wrapper]));
        assert_eq!(toggles(&c), 1);
        let button = c.page().element_by_id("lang-toggle").unwrap();
        assert_eq!(c.page().parent(button), Some(nav));
    }

    #[test]
    fn rtl_css_reported_off_without_stylesheet() {
        let html = r#"<html lang="en"><body><h1 data-en="Hi" data-fa="سلام">Hi</h1></body></html>"#;
        let mut c = controller_for(html, &MemoryStore::default(), &MemoryCookieJar::default());
        assert!(!c.is_rtl_css_enabled());

        c.apply(Language::Fa);
        assert!(!c.is_rtl_css_enabled());
        assert!(c.page().element_by_id("rtl-style").is_none());
        assert_eq!(text_of(&c, "h1"), "سلام");
    }
}
