// Precache manifest: which generation the worker owns and what it stores on install

use serde::{Deserialize, Serialize};

const VERSION_PARAM: &str = "v";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CacheManifest {
    pub app_id: String,
    pub version: String,
    /// Appended to the generation name and used as the cache-busting query value.
    pub asset_version: String,
    /// Assets that are cached both bare and with `?v=<asset_version>`.
    pub versioned_assets: Vec<String>,
    pub assets: Vec<String>,
    /// Served for document requests when the network is unreachable.
    pub offline_document: String,
    /// Base the entries are resolved against, relative to the worker script.
    /// Empty means the worker script URL itself.
    pub scope: String,
}

impl Default for CacheManifest {
    fn default() -> Self {
        let versioned_assets = [
            "./assets/css/main.css",
            "./assets/css/rtl.css",
            "./assets/css/lang-toggle.css",
            "./assets/js/main.js",
            "./assets/js/i18n.js",
        ];
        let assets = [
            "./assets/img/favicon.png",
            "./assets/img/apple-touch-icon.png",
            "./assets/img/logo.png",
            "./assets/img/hero-bg.jpg",
            "./assets/img/my-profile-img.jpg",
            "./assets/img/my-profile-img-2.jpg",
            "./assets/vendor/bootstrap/css/bootstrap.min.css",
            "./assets/vendor/bootstrap-icons/bootstrap-icons.css",
            "./assets/vendor/bootstrap/js/bootstrap.bundle.min.js",
            "./assets/vendor/aos/aos.css",
            "./assets/vendor/aos/aos.js",
            "./assets/vendor/glightbox/css/glightbox.min.css",
            "./assets/vendor/glightbox/js/glightbox.min.js",
            "./assets/vendor/swiper/swiper-bundle.min.css",
            "./assets/vendor/swiper/swiper-bundle.min.js",
            "./assets/vendor/typed.js/typed.umd.js",
            "./assets/vendor/purecounter/purecounter_vanilla.js",
            "./assets/vendor/waypoints/noframework.waypoints.js",
            "./assets/vendor/imagesloaded/imagesloaded.pkgd.min.js",
            "./assets/vendor/isotope-layout/isotope.pkgd.min.js",
            "./manifest.json",
        ];

        Self {
            app_id: "meet-aj".to_string(),
            version: "v1.0.5".to_string(),
            asset_version: "999".to_string(),
            versioned_assets: versioned_assets.iter().map(|s| s.to_string()).collect(),
            assets: assets.iter().map(|s| s.to_string()).collect(),
            offline_document: "./index.html".to_string(),
            scope: String::new(),
        }
    }
}

impl CacheManifest {
    /// Name of the generation this worker owns, e.g. `meet-aj-v1.0.5-999`.
    pub fn cache_name(&self) -> String {
        if self.asset_version.is_empty() {
            format!("{}-{}", self.app_id, self.version)
        } else {
            format!("{}-{}-{}", self.app_id, self.version, self.asset_version)
        }
    }

    /// Full install list in order: root, offline document, versioned assets,
    /// their cache-busted twins, then everything else.
    pub fn precache_urls(&self) -> Vec<String> {
        let mut urls = vec!["./".to_string()];
        if self.offline_document != "./" {
            urls.push(self.offline_document.clone());
        }
        urls.extend(self.versioned_assets.iter().cloned());
        if !self.asset_version.is_empty() {
            urls.extend(
                self.versioned_assets
                    .iter()
                    .map(|url| self.busted(url)),
            );
        }
        for url in &self.assets {
            if !urls.contains(url) {
                urls.push(url.clone());
            }
        }
        urls
    }

    fn busted(&self, url: &str) -> String {
        let sep = if url.contains('?') { '&' } else { '?' };
        format!("{url}{sep}{VERSION_PARAM}={}", self.asset_version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_generation_name_matches_site_release() {
        assert_eq!(CacheManifest::default().cache_name(), "meet-aj-v1.0.5-999");
    }

    #[test]
    fn generation_name_without_asset_version() {
        let manifest = CacheManifest {
            app_id: "site".to_string(),
            version: "v2".to_string(),
            asset_version: String::new(),
            ..CacheManifest::default()
        };
        assert_eq!(manifest.cache_name(), "site-v2");
        assert!(!manifest.precache_urls().iter().any(|u| u.contains("?v=")));
    }

    #[test]
    fn precache_lists_versioned_assets_twice() {
        let urls = CacheManifest::default().precache_urls();
        assert_eq!(urls[0], "./");
        assert_eq!(urls[1], "./index.html");
        assert!(urls.contains(&"./assets/css/main.css".to_string()));
        assert!(urls.contains(&"./assets/css/main.css?v=999".to_string()));
        assert_eq!(urls.last().map(String::as_str), Some("./manifest.json"));

        let bare = urls.iter().position(|u| u == "./assets/js/i18n.js").unwrap();
        let busted = urls.iter().position(|u| u == "./assets/js/i18n.js?v=999").unwrap();
        assert!(bare < busted);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let manifest: CacheManifest =
            serde_json::from_str(r#"{"version":"v2","assetVersion":"1000"}"#).unwrap();
        assert_eq!(manifest.cache_name(), "meet-aj-v2-1000");
        assert_eq!(manifest.offline_document, "./index.html");
        assert!(manifest.scope.is_empty());
    }

    #[test]
    fn scope_is_read_from_config() {
        let manifest: CacheManifest = serde_json::from_str(r#"{"scope":"../"}"#).unwrap();
        assert_eq!(manifest.scope, "../");
        assert_eq!(manifest.cache_name(), "meet-aj-v1.0.5-999");
    }
}
