use once_cell::sync::Lazy;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, UPGRADE_INSECURE_REQUESTS};
use scraper::{Html, Selector};
use url::Url;

use crate::models::PageMetadata;

// ── Constants ────────────────────────────────────────────────────────────────

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";
const ACCEPT_LANG: &str = "en-US,en;q=0.5";
const MAX_REDIRECTS: usize = 10;

/// Upper bound on `PageMetadata::images`.
pub const MAX_IMAGES: usize = 5;

/// Inputs that short-circuit to canned metadata without touching the network.
pub const SENTINEL_URLS: &[&str] = &["test", "https://test.com"];

// ── Lazy static selectors ────────────────────────────────────────────────────

static TITLE_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());

static IMG_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("Failed to fetch URL: {status} {reason}")]
    UpstreamStatus { status: u16, reason: String },
    #[error("Failed to fetch URL: {0}")]
    Request(String),
}

// ── Extractor ────────────────────────────────────────────────────────────────

/// Fetches a page and pulls title, description and candidate images out of it.
///
/// Holds one `reqwest::Client` for the life of the process; cloning is cheap.
#[derive(Clone)]
pub struct Extractor {
    client: reqwest::Client,
}

impl Extractor {
    pub fn new() -> Result<Self, ExtractionError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANG));
        headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));

        let client = reqwest::ClientBuilder::new()
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| ExtractionError::Request(e.to_string()))?;

        Ok(Self { client })
    }

    pub async fn extract(&self, url: &str) -> Result<PageMetadata, ExtractionError> {
        if let Some(canned) = sentinel_metadata(url) {
            tracing::debug!(url, "returning canned metadata for test input");
            return Ok(canned);
        }

        let parsed = validate_url(url)?;
        let html = self.fetch_html(parsed).await?;
        extract_from_html(&html, url)
    }

    async fn fetch_html(&self, url: Url) -> Result<String, ExtractionError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            tracing::warn!(error = %e, "page fetch failed");
            if e.is_connect() {
                ExtractionError::Request(format!("ConnectError: {}", e))
            } else if e.is_redirect() {
                ExtractionError::Request(format!("RedirectError: {}", e))
            } else {
                ExtractionError::Request(format!("RequestError: {}", e))
            }
        })?;

        let status = response.status();
        tracing::debug!(status = status.as_u16(), "upstream responded");

        if !status.is_success() {
            return Err(ExtractionError::UpstreamStatus {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| ExtractionError::Request(e.to_string()))
    }
}

// ── Test sentinel ────────────────────────────────────────────────────────────

pub fn sentinel_metadata(url: &str) -> Option<PageMetadata> {
    if !SENTINEL_URLS.contains(&url) {
        return None;
    }
    Some(PageMetadata {
        title: "Amazing Local Restaurant - Best Food in Town".to_string(),
        description: "Come try our delicious homemade pasta and fresh ingredients. \
                      Family owned since 1985."
            .to_string(),
        images: vec![
            "https://images.unsplash.com/photo-1517248135467-4c7edcad34c4?w=500".to_string(),
        ],
        source_url: "https://test.com".to_string(),
    })
}

// ── URL validation ───────────────────────────────────────────────────────────

fn validate_url(url: &str) -> Result<Url, ExtractionError> {
    if url.trim().is_empty() {
        return Err(ExtractionError::InvalidInput("URL is required".to_string()));
    }
    let parsed = Url::parse(url)
        .map_err(|_| ExtractionError::InvalidInput("Invalid URL format".to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        _ => Err(ExtractionError::InvalidInput(
            "Only http and https URLs are supported".to_string(),
        )),
    }
}

// ── Metadata extraction ──────────────────────────────────────────────────────

type Lookup = fn(&Html) -> Option<String>;

/// Precedence for `title`; first non-empty wins.
const TITLE_LOOKUPS: &[Lookup] = &[title_element, og_title, twitter_title];

/// Precedence for `description`; first non-empty wins.
const DESCRIPTION_LOOKUPS: &[Lookup] = &[meta_description, og_description, twitter_description];

pub fn extract_from_html(html: &str, page_url: &str) -> Result<PageMetadata, ExtractionError> {
    let base = validate_url(page_url)?;
    let document = Html::parse_document(html);

    Ok(PageMetadata {
        title: first_non_empty(&document, TITLE_LOOKUPS),
        description: first_non_empty(&document, DESCRIPTION_LOOKUPS),
        images: collect_images(&document, &base),
        source_url: page_url.to_string(),
    })
}

fn first_non_empty(document: &Html, lookups: &[Lookup]) -> String {
    lookups
        .iter()
        .find_map(|lookup| lookup(document))
        .unwrap_or_default()
}

fn title_element(document: &Html) -> Option<String> {
    document
        .select(&TITLE_SEL)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn og_title(document: &Html) -> Option<String> {
    meta_content(document, "property", "og:title")
}

fn twitter_title(document: &Html) -> Option<String> {
    meta_content(document, "name", "twitter:title")
}

fn meta_description(document: &Html) -> Option<String> {
    meta_content(document, "name", "description")
}

fn og_description(document: &Html) -> Option<String> {
    meta_content(document, "property", "og:description")
}

fn twitter_description(document: &Html) -> Option<String> {
    meta_content(document, "name", "twitter:description")
}

/// Trimmed `content` of the first `meta[attr="value"]`, if non-empty.
fn meta_content(document: &Html, attr: &str, value: &str) -> Option<String> {
    let sel_str = format!(r#"meta[{}="{}"]"#, attr, value);
    // Use .ok() immediately to drop SelectorErrorKind<'_> before sel_str is dropped.
    let sel = Selector::parse(&sel_str).ok()?;
    document
        .select(&sel)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

// ── Image helpers ────────────────────────────────────────────────────────────

fn collect_images(document: &Html, base: &Url) -> Vec<String> {
    let mut images: Vec<String> = Vec::with_capacity(MAX_IMAGES);

    // Card images are taken unconditionally; <img> scanning stops at the cap.
    let card_images = [
        meta_content(document, "property", "og:image"),
        meta_content(document, "name", "twitter:image"),
    ];
    for src in card_images.iter().flatten() {
        push_resolved(&mut images, base, src);
    }

    for img in document.select(&IMG_SEL) {
        if images.len() >= MAX_IMAGES {
            break;
        }
        if let Some(src) = img.value().attr("src") {
            push_resolved(&mut images, base, src);
        }
    }

    images
}

fn push_resolved(images: &mut Vec<String>, base: &Url, src: &str) {
    let src = src.trim();
    if src.is_empty() {
        return;
    }
    match base.join(src) {
        Ok(resolved) => {
            let resolved = resolved.to_string();
            if !images.contains(&resolved) {
                images.push(resolved);
            }
        }
        Err(e) => tracing::debug!(src, error = %e, "skipping unresolvable image URL"),
    }
}
