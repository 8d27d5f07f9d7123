/// Category scanning for item page URLs
use super::client::SiteClient;
use crate::config::Config;
use crate::error::{HarvestError, Result};
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Collects unique item page URLs across the configured categories
#[derive(Clone)]
pub struct PageDiscovery {
    client: SiteClient,
    categories: Vec<String>,
    rule: ItemLinkRule,
    max_pages: usize,
    category_delay: Duration,
    skip_failed_categories: bool,
}

/// Decides whether an href points at an item page
#[derive(Debug, Clone)]
pub struct ItemLinkRule {
    /// Required path prefix
    pub prefix: String,
    /// Required number of `/` characters
    pub depth: usize,
}

impl ItemLinkRule {
    pub fn matches(&self, href: &str) -> bool {
        href.starts_with(&self.prefix) && href.matches('/').count() == self.depth
    }
}

/// Insertion-ordered set of page URLs with a hard size limit
#[derive(Debug)]
pub struct PageSet {
    pages: Vec<String>,
    seen: HashSet<String>,
    cap: usize,
}

impl PageSet {
    pub fn with_cap(cap: usize) -> Self {
        Self {
            pages: Vec::new(),
            seen: HashSet::new(),
            cap,
        }
    }

    /// Add a URL; returns false for duplicates and once the cap is reached
    pub fn insert(&mut self, url: String) -> bool {
        if self.is_full() || self.seen.contains(&url) {
            return false;
        }
        self.seen.insert(url.clone());
        self.pages.push(url);
        true
    }

    pub fn is_full(&self) -> bool {
        self.pages.len() >= self.cap
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn into_pages(self) -> Vec<String> {
        self.pages
    }
}

impl PageDiscovery {
    pub fn new(client: SiteClient, config: &Config) -> Self {
        Self {
            client,
            categories: config.site.categories.clone(),
            rule: ItemLinkRule {
                prefix: config.site.item_prefix.clone(),
                depth: config.site.item_path_depth,
            },
            max_pages: config.discovery.max_pages,
            category_delay: Duration::from_millis(config.discovery.category_delay_ms),
            skip_failed_categories: config.discovery.skip_failed_categories,
        }
    }

    /// Scan every category in order and return the collected item pages
    pub async fn discover_pages(&self) -> Result<Vec<String>> {
        let mut pages = PageSet::with_cap(self.max_pages);

        for category in &self.categories {
            if pages.is_full() {
                debug!(
                    "Discovery cap of {} reached, skipping remaining categories",
                    self.max_pages
                );
                break;
            }

            let url = self.client.absolute(category);
            info!("🔍 Scanning category: {}", category);

            let fetched = self.client.fetch_page(&url).await;
            tokio::time::sleep(self.category_delay).await;

            let html = match fetched {
                Ok(html) => html,
                Err(e) if self.skip_failed_categories => {
                    warn!("⚠️ Skipping unreachable category {}: {}", category, e);
                    continue;
                }
                Err(e) => {
                    return Err(HarvestError::Category {
                        category: category.clone(),
                        reason: e.to_string(),
                    });
                }
            };

            let added = collect_item_links(&html, &self.rule, self.client.base_url(), &mut pages);
            debug!("Category {} contributed {} new item pages", category, added);
        }

        info!("📄 Discovered {} candidate item pages", pages.len());
        Ok(pages.into_pages())
    }
}

/// Add every qualifying item link in `html` to `pages`; returns how many were new
pub fn collect_item_links(
    html: &str,
    rule: &ItemLinkRule,
    base_url: &str,
    pages: &mut PageSet,
) -> usize {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return 0;
    };

    let mut added = 0;
    for element in document.select(&selector) {
        if pages.is_full() {
            break;
        }
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        if rule.matches(href) && pages.insert(format!("{}{}", base_url, href)) {
            added += 1;
        }
    }
    added
}
