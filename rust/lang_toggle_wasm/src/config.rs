// Page conventions the controller relies on; overridable from the host page

use serde::{Deserialize, Serialize};

use crate::language::Language;

const ONE_YEAR_SECS: u64 = 31_536_000;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct I18nConfig {
    pub storage_key: String,
    pub cookie_name: String,
    pub cookie_max_age: u64,
    pub toggle_id: String,
    pub rtl_stylesheet_id: String,
    pub loader_id: String,
    pub loader_text_selector: String,
    pub primary_attr: String,
    pub secondary_attr: String,
    /// Where the toggle is injected, first match wins; falls back to `<body>`.
    pub container_selectors: Vec<String>,
}

impl Default for I18nConfig {
    fn default() -> Self {
        let containers = [
            "nav", ".navbar", ".navmenu", "header", ".header", ".topbar", "#header", "#navmenu",
        ];
        Self {
            storage_key: "lang".to_string(),
            cookie_name: "lang".to_string(),
            cookie_max_age: ONE_YEAR_SECS,
            toggle_id: "lang-toggle".to_string(),
            rtl_stylesheet_id: "rtl-style".to_string(),
            loader_id: "preloader".to_string(),
            loader_text_selector: ".preloader-text".to_string(),
            primary_attr: "data-en".to_string(),
            secondary_attr: "data-fa".to_string(),
            container_selectors: containers.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl I18nConfig {
    pub fn text_attr(&self, lang: Language) -> &str {
        if lang == Language::PRIMARY {
            &self.primary_attr
        } else {
            &self.secondary_attr
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_merge_with_defaults() {
        let cfg: I18nConfig =
            serde_json::from_str(r##"{"toggleId":"switch","containerSelectors":["#top"]}"##).unwrap();
        assert_eq!(cfg.toggle_id, "switch");
        assert_eq!(cfg.container_selectors, vec!["#top".to_string()]);
        assert_eq!(cfg.cookie_max_age, 31_536_000);
        assert_eq!(cfg.text_attr(Language::Fa), "data-fa");
    }
}
