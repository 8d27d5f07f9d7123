/// Item page metadata extraction
use super::client::SiteClient;
use super::duration::parse_duration;
use super::AssetMetadata;
use scraper::{Html, Selector};
use tracing::{debug, warn};

/// Duration label selectors, tried in order
const DURATION_SELECTORS: [&str; 2] = [
    "div.item-grid-sfx-preview__meta-time",
    "div[data-test-id=\"duration\"]",
];

/// Attribute holding the direct preview URL
const ASSET_URL_ATTRIBUTE: &str = "data-audio-player-preview-url-value";

/// Fetches item pages and reads their duration and asset URL
#[derive(Clone)]
pub struct MetadataExtractor {
    client: SiteClient,
}

impl MetadataExtractor {
    pub fn new(client: SiteClient) -> Self {
        Self { client }
    }

    /// Best-effort metadata lookup.
    ///
    /// Never fails: an unreachable or unparseable page is reported exactly
    /// like a page that carries no metadata.
    pub async fn get_metadata(&self, page_url: &str) -> AssetMetadata {
        match self.client.fetch_page(page_url).await {
            Ok(html) => extract_metadata(&html),
            Err(e) => {
                warn!("Failed to read item page {}: {}", page_url, e);
                AssetMetadata::default()
            }
        }
    }
}

/// Read the duration and asset URL from item page HTML
pub fn extract_metadata(html: &str) -> AssetMetadata {
    let document = Html::parse_document(html);

    let duration_seconds = match find_duration_label(&document) {
        Some(label) => {
            let seconds = parse_duration(&label);
            debug!("⏱️ Found duration: {} -> {}s", label, seconds);
            seconds
        }
        None => 0,
    };

    AssetMetadata {
        duration_seconds,
        asset_url: find_asset_url(&document),
    }
}

fn find_duration_label(document: &Html) -> Option<String> {
    for selector_str in DURATION_SELECTORS {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            let label: String = element.text().map(str::trim).collect();
            return Some(label);
        }
    }
    None
}

fn find_asset_url(document: &Html) -> Option<String> {
    let selector = Selector::parse(&format!("div[{}]", ASSET_URL_ATTRIBUTE)).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr(ASSET_URL_ATTRIBUTE))
        .map(str::to_string)
}
