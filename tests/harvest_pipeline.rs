//! End-to-end tests for the harvesting pipeline against a mocked catalog site.

use sfx_harvester::catalog::read_records;
use sfx_harvester::harvest::{HarvestProgress, MetadataExtractor, SiteClient};
use sfx_harvester::{
    AssetMetadata, CatalogIterator, CatalogRecord, Config, ConfigBuilder, HarvestError,
    HarvestTargets, Harvester,
};
use std::collections::HashMap;
use tempfile::TempDir;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

const ROOT: &str = "/free-sound-effects/";

/// One item page served by the mock site
struct Item {
    duration: &'static str,
    asset: Option<&'static str>,
}

/// Serves item pages by slug; unknown slugs get a 404
struct ItemPages {
    base: String,
    items: HashMap<String, Item>,
}

impl Respond for ItemPages {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let slug = request.url.path().trim_matches('/').rsplit('/').next().unwrap_or_default();
        match self.items.get(slug) {
            Some(item) => ResponseTemplate::new(200).set_body_string(item_page(&self.base, item)),
            None => ResponseTemplate::new(404),
        }
    }
}

/// Generates an admissible item page for any `item-N` slug
struct GeneratedItems {
    base: String,
}

impl Respond for GeneratedItems {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let slug = request.url.path().trim_matches('/').rsplit('/').next().unwrap_or_default();
        let html = format!(
            r#"<div class="item-grid-sfx-preview__meta-time">0:30</div>
               <div data-audio-player-preview-url-value="{}/assets/{}.mp3"></div>"#,
            self.base, slug
        );
        ResponseTemplate::new(200).set_body_string(html)
    }
}

fn item_page(base: &str, item: &Item) -> String {
    let asset = item
        .asset
        .map(|a| {
            format!(
                r#"<div class="player" data-audio-player-preview-url-value="{}{}"></div>"#,
                base, a
            )
        })
        .unwrap_or_default();
    format!(
        r#"<html><body>
            <div class="item-grid-sfx-preview__meta-time">{}</div>
            {}
        </body></html>"#,
        item.duration, asset
    )
}

fn listing_page(hrefs: &[String]) -> String {
    let links: String = hrefs.iter().map(|h| format!(r#"<a href="{}">sound</a>"#, h)).collect();
    format!("<html><body><nav><a href=\"/pricing/\">Pricing</a></nav>{}</body></html>", links)
}

fn test_config(server: &MockServer, categories: &[&str]) -> Config {
    ConfigBuilder::new()
        .with_base_url(server.uri())
        .with_categories(categories.iter().copied())
        .without_delays()
        .build()
}

async fn mount_listing(server: &MockServer, category: &str, hrefs: &[String]) {
    Mock::given(method("GET"))
        .and(path(category))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(hrefs)))
        .mount(server)
        .await;
}

async fn mount_assets(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path_regex(r"^/assets/.+$"))
        .respond_with(
            ResponseTemplate::new(200).set_body_bytes(b"ID3\x04fake mp3 payload".to_vec()),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/empty/.+$"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/gone/.+$"))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;
}

/// Mock site with one listing page mixing admissible and rejected items
async fn mixed_site() -> MockServer {
    let server = MockServer::start().await;

    let items: HashMap<String, Item> = [
        ("long-rain", Item { duration: "0:30", asset: Some("/assets/long-rain.mp3") }),
        ("exact-threshold", Item { duration: "0:10", asset: Some("/assets/exact.mp3") }),
        ("just-over", Item { duration: "11 sec", asset: Some("/assets/just-over") }),
        ("short-click", Item { duration: "0:05", asset: Some("/assets/click.mp3") }),
        ("no-asset", Item { duration: "0:45", asset: None }),
        ("missing-file", Item { duration: "0:25", asset: Some("/gone/wind.mp3") }),
        ("empty-file", Item { duration: "0:40", asset: Some("/empty/thunder.mp3") }),
    ]
    .into_iter()
    .map(|(slug, item)| (slug.to_string(), item))
    .collect();

    let hrefs: Vec<String> = [
        "long-rain",
        "exact-threshold",
        "just-over",
        "long-rain",
        "short-click",
        "no-asset",
        "missing-file",
        "empty-file",
    ]
    .iter()
    .map(|slug| format!("{}{}/", ROOT, slug))
    .chain(["/free-sound-effects/animals/dog/".to_string(), "/video/clip/".to_string()])
    .collect();

    mount_listing(&server, ROOT, &hrefs).await;
    mount_assets(&server).await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/free-sound-effects/[^/]+/$"))
        .respond_with(ItemPages {
            base: server.uri(),
            items,
        })
        .mount(&server)
        .await;

    server
}

fn item_page_requests(requests: &[Request]) -> usize {
    requests
        .iter()
        .filter(|r| r.url.path().starts_with("/free-sound-effects/item-"))
        .count()
}

#[tokio::test]
async fn test_run_writes_only_admitted_assets() {
    let server = mixed_site().await;
    let output = TempDir::new().unwrap();

    let harvester = Harvester::new(test_config(&server, &[ROOT])).unwrap();
    let catalog_path = harvester.run(output.path(), 0, 50, 10).await.unwrap();

    assert_eq!(catalog_path, output.path().join("annotation.csv"));
    let records = read_records(&catalog_path).unwrap();
    let names: Vec<&str> = records.iter().map(|r| r.filename.as_str()).collect();
    assert_eq!(names, vec!["long-rain.mp3", "just-over.mp3"]);
    assert_eq!(records[0].duration_seconds, 30);
    assert_eq!(records[1].duration_seconds, 11);
    assert_eq!(records[1].relative_path, "just-over.mp3");

    for record in &records {
        let meta = std::fs::metadata(&record.absolute_path).unwrap();
        assert!(meta.len() > 0);
    }
    assert!(!output.path().join("exact.mp3").exists());
    assert!(!output.path().join("thunder.mp3").exists());
}

#[tokio::test]
async fn test_summary_counts_and_minimum_warning() {
    let server = mixed_site().await;
    let output = TempDir::new().unwrap();

    let harvester = Harvester::new(test_config(&server, &[ROOT])).unwrap();
    let targets = HarvestTargets {
        min_files: 3,
        max_files: 50,
        min_duration: 10,
    };
    let summary = harvester.harvest(output.path(), targets).await.unwrap();

    assert_eq!(summary.pages_discovered, 7);
    assert_eq!(
        summary.progress,
        HarvestProgress {
            pages_visited: 7,
            accepted: 2,
            rejected: 5,
        }
    );
    assert!(summary.below_minimum());
}

#[tokio::test]
async fn test_catalog_round_trip_and_stale_rows() {
    let server = mixed_site().await;
    let output = TempDir::new().unwrap();

    let harvester = Harvester::new(test_config(&server, &[ROOT])).unwrap();
    let catalog_path = harvester.run(output.path(), 0, 50, 10).await.unwrap();
    let records = read_records(&catalog_path).unwrap();

    let catalog = CatalogIterator::open(&catalog_path).unwrap();
    assert_eq!(catalog.len(), records.len());
    let iterated: Vec<String> = catalog.iter().map(|p| p.to_string_lossy().into_owned()).collect();
    let written: Vec<String> = records.iter().map(|r| r.absolute_path.clone()).collect();
    assert_eq!(iterated, written);
    assert!(catalog.iter().all(|p| p.exists()));

    std::fs::remove_file(&records[0].absolute_path).unwrap();
    let catalog = CatalogIterator::open(&catalog_path).unwrap();
    assert_eq!(catalog.len(), records.len() - 1);
}

#[tokio::test]
async fn test_rerun_overwrites_catalog() {
    let server = mixed_site().await;
    let output = TempDir::new().unwrap();
    let harvester = Harvester::new(test_config(&server, &[ROOT])).unwrap();

    let first = harvester.run(output.path(), 0, 50, 10).await.unwrap();
    let second = harvester.run(output.path(), 0, 50, 10).await.unwrap();
    assert_eq!(first, second);

    let content = std::fs::read_to_string(&second).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines[0], "absolute_path,relative_path,filename,duration_seconds");
    assert_eq!(lines.len(), 3);
    assert_eq!(read_records(&second).unwrap().len(), 2);
}

#[tokio::test]
async fn test_discovery_stops_at_cap() {
    let server = MockServer::start().await;
    let categories = [
        "/free-sound-effects/",
        "/free-sound-effects/animals/",
        "/free-sound-effects/nature/",
    ];

    for (c, category) in categories.iter().enumerate() {
        let hrefs: Vec<String> = (0..75).map(|i| format!("{}item-{}-{}/", ROOT, c, i)).collect();
        mount_listing(&server, category, &hrefs).await;
    }

    let harvester = Harvester::new(test_config(&server, &categories)).unwrap();
    let pages = harvester.discovery().discover_pages().await.unwrap();

    assert_eq!(pages.len(), 100);
    assert_eq!(pages[0], format!("{}{}item-0-0/", server.uri(), ROOT));
    assert_eq!(pages[99], format!("{}{}item-1-24/", server.uri(), ROOT));

    let requests = server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| r.url.path() != "/free-sound-effects/nature/"));
}

#[tokio::test]
async fn test_writer_stops_visiting_pages_at_max_files() {
    let server = MockServer::start().await;
    mount_assets(&server).await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/free-sound-effects/item-\d+/$"))
        .respond_with(GeneratedItems { base: server.uri() })
        .mount(&server)
        .await;

    let pages: Vec<String> =
        (0..200).map(|i| format!("{}{}item-{}/", server.uri(), ROOT, i)).collect();
    let output = TempDir::new().unwrap();
    let harvester = Harvester::new(test_config(&server, &[ROOT])).unwrap();
    let targets = HarvestTargets {
        min_files: 0,
        max_files: 5,
        min_duration: 10,
    };

    let mut sink: Vec<CatalogRecord> = Vec::new();
    let progress = harvester
        .harvest_pages(&pages, output.path(), &targets, &mut sink)
        .await
        .unwrap();

    assert_eq!(sink.len(), 5);
    assert_eq!(progress.accepted, 5);
    assert_eq!(progress.pages_visited, 5);
    assert_eq!(sink[4].filename, "item-4.mp3");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(item_page_requests(&requests), 5);
}

#[tokio::test]
async fn test_unreachable_category_aborts_discovery() {
    let server = MockServer::start().await;
    mount_listing(&server, ROOT, &[format!("{}rain/", ROOT)]).await;
    Mock::given(method("GET"))
        .and(path("/free-sound-effects/animals/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let categories = [ROOT, "/free-sound-effects/animals/"];
    let harvester = Harvester::new(test_config(&server, &categories)).unwrap();
    let result = harvester.discovery().discover_pages().await;
    let Err(HarvestError::Category { category, .. }) = result else {
        panic!("unreachable category did not abort discovery");
    };
    assert_eq!(category, "/free-sound-effects/animals/");

    let output = TempDir::new().unwrap();
    let run = harvester.run(output.path(), 0, 50, 10).await;
    assert!(run.is_err());
    assert!(!output.path().join("annotation.csv").exists());
}

#[tokio::test]
async fn test_unreachable_category_can_be_skipped() {
    let server = MockServer::start().await;
    mount_listing(&server, ROOT, &[format!("{}rain/", ROOT)]).await;

    let categories = ["/free-sound-effects/animals/", ROOT];
    let config = ConfigBuilder::from_config(test_config(&server, &categories))
        .skip_failed_categories(true)
        .build();
    let harvester = Harvester::new(config).unwrap();
    let pages = harvester.discovery().discover_pages().await.unwrap();

    assert_eq!(pages, vec![format!("{}{}rain/", server.uri(), ROOT)]);
}

#[tokio::test]
async fn test_metadata_failure_degrades_to_nothing_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/free-sound-effects/broken/"))
        .respond_with(ResponseTemplate::new(500).set_body_string(
            r#"<div class="item-grid-sfx-preview__meta-time">0:30</div>"#,
        ))
        .mount(&server)
        .await;

    let client = SiteClient::new(&test_config(&server, &[ROOT])).unwrap();
    let extractor = MetadataExtractor::new(client);

    let broken_url = format!("{}/free-sound-effects/broken/", server.uri());
    let broken = extractor.get_metadata(&broken_url).await;
    assert_eq!(broken, AssetMetadata::default());

    let unreachable = extractor.get_metadata("http://127.0.0.1:9/free-sound-effects/none/").await;
    assert_eq!(unreachable, AssetMetadata::default());
}
