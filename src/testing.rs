//! Test doubles shared by unit tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::services::Notifier;
use crate::storage::{RecordMap, SnapshotStorage};
use crate::utils::{Fetch, FetchedPage};

/// Serves canned bodies for URLs containing a registered pattern.
/// Unmatched URLs fail like a 404.
#[derive(Default)]
pub struct MockFetcher {
    routes: Mutex<Vec<(String, String)>>,
    redirects: Vec<(String, String)>,
    delay: Duration,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for URLs containing `pattern`. Later routes win.
    pub fn route(self, pattern: &str, body: &str) -> Self {
        self.add_route(pattern, body);
        self
    }

    /// Report `final_url` for URLs containing `pattern`.
    pub fn redirect(mut self, pattern: &str, final_url: &str) -> Self {
        self.redirects.push((pattern.to_string(), final_url.to_string()));
        self
    }

    /// Hold every request open for `delay`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Register a route after construction; it takes priority over older ones.
    pub fn add_route(&self, pattern: &str, body: &str) {
        self.routes
            .lock()
            .unwrap()
            .insert(0, (pattern.to_string(), body.to_string()));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Highest number of requests observed in flight at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetch for MockFetcher {
    async fn get(&self, url: &str) -> Result<FetchedPage> {
        self.calls.lock().unwrap().push(url.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let body = self
            .routes
            .lock()
            .unwrap()
            .iter()
            .find(|(pattern, _)| url.contains(pattern.as_str()))
            .map(|(_, body)| body.clone());
        let final_url = self
            .redirects
            .iter()
            .find(|(pattern, _)| url.contains(pattern.as_str()))
            .map_or_else(|| url.to_string(), |(_, target)| target.clone());

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        body.map(|body| FetchedPage { final_url, body })
            .ok_or_else(|| AppError::source_unavailable("mock", format!("404 for {url}")))
    }
}

/// Collects every alert.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, subject: &str, body: &str) {
        self.sent
            .lock()
            .unwrap()
            .push((subject.to_string(), body.to_string()));
    }
}

/// In-memory snapshot backend counting saves.
#[derive(Default)]
pub struct MemoryStorage {
    snapshot: Mutex<Option<RecordMap>>,
    saves: AtomicUsize,
}

impl MemoryStorage {
    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> Option<RecordMap> {
        self.snapshot.lock().unwrap().clone()
    }
}

#[async_trait]
impl SnapshotStorage for MemoryStorage {
    async fn load(&self) -> Result<Option<RecordMap>> {
        Ok(self.snapshot())
    }

    async fn save(&self, records: &RecordMap) -> Result<()> {
        *self.snapshot.lock().unwrap() = Some(records.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

/// Product page HTML with a `__NEXT_DATA__` payload.
///
/// Variants are `(entity id, sku, available to sell)`. The path is the
/// slugged name.
pub fn product_page(product_id: &str, name: &str, variants: &[(&str, &str, u64)]) -> String {
    let variants: Vec<serde_json::Value> = variants
        .iter()
        .map(|(id, sku, inventory)| {
            serde_json::json!({
                "entityId": id.parse::<u64>().unwrap(),
                "sku": sku,
                "inventory": { "aggregated": { "availableToSell": inventory } }
            })
        })
        .collect();

    let data = serde_json::json!({
        "props": { "pageProps": { "product": {
            "id": format!("gid://storefront/Product/{product_id}"),
            "entityId": product_id.parse::<u64>().unwrap(),
            "name": name,
            "sku": format!("SKU-{product_id}"),
            "path": format!("/{}/", slug(name)),
            "prices": { "price": { "value": 25.0 } },
            "defaultImage": { "urlOriginal": format!("https://cdn.example.com/{product_id}.jpg") },
            "variants": variants,
        } } }
    });

    format!(
        r#"<html><head><title>{name}</title></head><body><div id="__next"></div>
<script id="__NEXT_DATA__" type="application/json">{data}</script></body></html>"#
    )
}

/// Search API body with a single hit.
pub fn search_hit(product_id: &str, url: &str) -> String {
    serde_json::json!({
        "results": [{ "uid": product_id, "id": format!("ss-{product_id}"), "url": url }]
    })
    .to_string()
}

pub fn slug(name: &str) -> String {
    name.to_lowercase().replace(' ', "-")
}
