//! Request Classification
//!
//! Maps each intercepted request to a caching class. Rules are evaluated in
//! a fixed order and the first match wins; every request lands in exactly
//! one class.
//!
//! Signals consumed: HTTP method, URL (host, path, extension), the
//! `Sec-Fetch-Dest` destination hint, the `Sec-Fetch-Mode` navigation flag,
//! and the `Accept` header.

use axum::http::{header, HeaderMap, Method};
use url::Url;

use super::spaces::Space;
use crate::config::Config;

// == Extension Patterns ==
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "svg", "ico", "avif"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "ogv", "mov", "m4v"];
const STATIC_EXTENSIONS: &[&str] = &["js", "mjs", "css", "woff", "woff2", "ttf", "otf"];

// == Request Class ==
/// How an intercepted request is served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
    /// Passes through untouched, no cache involvement.
    Bypass,
    /// Serve from the space when present, hit the network otherwise.
    CacheFirst(Space),
    /// Hit the network, fall back to the space on failure.
    NetworkFirst(Space),
}

// == Classification Rules ==
/// Deployment-specific inputs to classification.
#[derive(Debug, Clone)]
pub struct ClassifyRules {
    /// Admin panel prefix, never intercepted
    pub admin_prefix: String,
    /// Built static asset prefix
    pub static_prefix: String,
    /// Known image hosting hostnames
    pub image_hosts: Vec<String>,
    /// Known video hosting hostnames
    pub video_hosts: Vec<String>,
    /// Document database and companion app hosting hostnames
    pub database_hosts: Vec<String>,
}

impl ClassifyRules {
    pub fn from_config(config: &Config) -> Self {
        Self {
            admin_prefix: config.admin_prefix.clone(),
            static_prefix: config.static_prefix.clone(),
            image_hosts: config.image_hosts.clone(),
            video_hosts: config.video_hosts.clone(),
            database_hosts: config.database_hosts.clone(),
        }
    }

    // == Classify ==
    /// Classifies one request. First matching rule wins:
    ///
    /// 1. Non-GET → bypass
    /// 2. Admin prefix → bypass
    /// 3. Image-typed → cache-first, image space
    /// 4. Video-typed → cache-first, video space
    /// 5. Database / app hosting hostname → network-first, API space
    /// 6. Static prefix or script/style/font extension → cache-first, shell space
    /// 7. Navigation or HTML `Accept` → network-first, shell space
    /// 8. Otherwise → bypass
    pub fn classify(&self, method: &Method, url: &Url, headers: &HeaderMap) -> RequestClass {
        if method != Method::GET {
            return RequestClass::Bypass;
        }
        if url.path().starts_with(&self.admin_prefix) {
            return RequestClass::Bypass;
        }

        if destination_is(headers, "image")
            || has_extension(url, IMAGE_EXTENSIONS)
            || host_in(url, &self.image_hosts)
        {
            return RequestClass::CacheFirst(Space::Images);
        }
        if destination_is(headers, "video")
            || has_extension(url, VIDEO_EXTENSIONS)
            || host_in(url, &self.video_hosts)
        {
            return RequestClass::CacheFirst(Space::Videos);
        }
        if host_in(url, &self.database_hosts) {
            return RequestClass::NetworkFirst(Space::Api);
        }
        if url.path().starts_with(&self.static_prefix) || has_extension(url, STATIC_EXTENSIONS) {
            return RequestClass::CacheFirst(Space::Shell);
        }
        if is_navigation(headers) || accepts_html(headers) {
            return RequestClass::NetworkFirst(Space::Shell);
        }

        RequestClass::Bypass
    }
}

// == Signal Helpers ==

fn destination_is(headers: &HeaderMap, destination: &str) -> bool {
    headers
        .get("sec-fetch-dest")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == destination)
        .unwrap_or(false)
}

fn is_navigation(headers: &HeaderMap) -> bool {
    headers
        .get("sec-fetch-mode")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == "navigate")
        .unwrap_or(false)
}

fn accepts_html(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("text/html"))
        .unwrap_or(false)
}

/// Last path segment's extension, lowercased, matched against a pattern set.
fn has_extension(url: &Url, extensions: &[&str]) -> bool {
    let path = url.path();
    let last = path.rsplit('/').next().unwrap_or(path);
    match last.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            let ext = ext.to_ascii_lowercase();
            extensions.iter().any(|e| *e == ext)
        }
        _ => false,
    }
}

/// Exact host or subdomain-of match.
fn host_in(url: &Url, hosts: &[String]) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };
    hosts
        .iter()
        .any(|h| host == h || host.ends_with(&format!(".{h}")))
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> ClassifyRules {
        ClassifyRules {
            admin_prefix: "/admin".to_string(),
            static_prefix: "/assets".to_string(),
            image_hosts: vec!["images.example.com".to_string()],
            video_hosts: vec!["videos.example.com".to_string()],
            database_hosts: vec!["db.example-app.com".to_string()],
        }
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn classify(method: Method, u: &str, headers: HeaderMap) -> RequestClass {
        rules().classify(&method, &url(u), &headers)
    }

    #[test]
    fn test_non_get_bypasses() {
        let class = classify(Method::POST, "https://site.example/pic.png", HeaderMap::new());
        assert_eq!(class, RequestClass::Bypass);
    }

    #[test]
    fn test_admin_prefix_bypasses_even_for_images() {
        let class = classify(
            Method::GET,
            "https://site.example/admin/uploads/pic.png",
            HeaderMap::new(),
        );
        assert_eq!(class, RequestClass::Bypass);
    }

    #[test]
    fn test_image_by_extension() {
        let class = classify(Method::GET, "https://site.example/hero.WEBP", HeaderMap::new());
        assert_eq!(class, RequestClass::CacheFirst(Space::Images));
    }

    #[test]
    fn test_image_by_destination_hint() {
        let mut headers = HeaderMap::new();
        headers.insert("sec-fetch-dest", "image".parse().unwrap());
        let class = classify(Method::GET, "https://site.example/media/42", headers);
        assert_eq!(class, RequestClass::CacheFirst(Space::Images));
    }

    #[test]
    fn test_image_by_host() {
        let class = classify(
            Method::GET,
            "https://cdn.images.example.com/raw/42",
            HeaderMap::new(),
        );
        assert_eq!(class, RequestClass::CacheFirst(Space::Images));
    }

    #[test]
    fn test_video_by_extension() {
        let class = classify(Method::GET, "https://site.example/clip.mp4", HeaderMap::new());
        assert_eq!(class, RequestClass::CacheFirst(Space::Videos));
    }

    #[test]
    fn test_database_host_is_network_first() {
        let class = classify(
            Method::GET,
            "https://db.example-app.com/v1/documents",
            HeaderMap::new(),
        );
        assert_eq!(class, RequestClass::NetworkFirst(Space::Api));
    }

    #[test]
    fn test_static_prefix_and_extensions_hit_shell() {
        assert_eq!(
            classify(Method::GET, "https://site.example/assets/app.bin", HeaderMap::new()),
            RequestClass::CacheFirst(Space::Shell)
        );
        assert_eq!(
            classify(Method::GET, "https://site.example/bundle.js", HeaderMap::new()),
            RequestClass::CacheFirst(Space::Shell)
        );
        assert_eq!(
            classify(Method::GET, "https://site.example/fonts/inter.woff2", HeaderMap::new()),
            RequestClass::CacheFirst(Space::Shell)
        );
    }

    #[test]
    fn test_navigation_is_network_first_shell() {
        let mut headers = HeaderMap::new();
        headers.insert("sec-fetch-mode", "navigate".parse().unwrap());
        let class = classify(Method::GET, "https://site.example/pricing", headers);
        assert_eq!(class, RequestClass::NetworkFirst(Space::Shell));

        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            "text/html,application/xhtml+xml".parse().unwrap(),
        );
        let class = classify(Method::GET, "https://site.example/pricing", headers);
        assert_eq!(class, RequestClass::NetworkFirst(Space::Shell));
    }

    #[test]
    fn test_unmatched_request_bypasses() {
        let class = classify(Method::GET, "https://site.example/api/contact", HeaderMap::new());
        assert_eq!(class, RequestClass::Bypass);
    }

    #[test]
    fn test_image_rule_wins_over_static_prefix() {
        // Rule order: image extension beats the static prefix.
        let class = classify(
            Method::GET,
            "https://site.example/assets/logo.png",
            HeaderMap::new(),
        );
        assert_eq!(class, RequestClass::CacheFirst(Space::Images));
    }

    #[test]
    fn test_dotfile_has_no_extension() {
        let class = classify(Method::GET, "https://site.example/.well-known/x", HeaderMap::new());
        assert_eq!(class, RequestClass::Bypass);
    }
}
