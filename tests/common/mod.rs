//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;

use imgdupe::content::ContentFetcher;
use imgdupe::pipeline::Pipeline;
use imgdupe::remote::{CatalogClient, HttpResponse, HttpTransport, TransportError};
use imgdupe::store::MetadataStore;

pub const API: &str = "https://api.test/3";
pub const ACCOUNT: &str = "someone";

/// In-memory transport: answers from a route table, 404 for unknown URLs,
/// and records every requested URL.
#[derive(Default)]
pub struct FakeTransport {
    routes: RefCell<HashMap<String, HttpResponse>>,
    calls: RefCell<Vec<String>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(&self, url: &str, status: u16, body: &[u8]) {
        self.routes
            .borrow_mut()
            .insert(url.to_string(), HttpResponse::new(status, body.to_vec()));
    }

    pub fn unroute(&self, url: &str) {
        self.routes.borrow_mut().remove(url);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls.borrow().iter().filter(|u| *u == url).count()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    /// Serve a catalog made of `pages`, reporting `count` items.
    pub fn serve_catalog(&self, count: u64, pages: &[Vec<(&str, i64)>]) {
        self.route(
            &count_url(),
            200,
            format!(r#"{{"data": {count}}}"#).as_bytes(),
        );
        for (i, items) in pages.iter().enumerate() {
            let data: Vec<serde_json::Value> = items
                .iter()
                .map(|(id, dt)| {
                    serde_json::json!({
                        "id": id,
                        "link": image_url(id),
                        "datetime": dt,
                        "type": "image/png",
                    })
                })
                .collect();
            self.route(
                &page_url(i as u64),
                200,
                serde_json::json!({ "data": data, "success": true }).to_string().as_bytes(),
            );
        }
    }

    pub fn serve_image(&self, id: &str, body: &[u8]) {
        self.route(&image_url(id), 200, body);
    }
}

impl HttpTransport for FakeTransport {
    fn get(&self, url: &str, _headers: &[(&str, String)]) -> Result<HttpResponse, TransportError> {
        self.calls.borrow_mut().push(url.to_string());
        Ok(self
            .routes
            .borrow()
            .get(url)
            .cloned()
            .unwrap_or_else(|| HttpResponse::new(404, Vec::new())))
    }
}

pub fn count_url() -> String {
    format!("{API}/account/{ACCOUNT}/images/count")
}

pub fn page_url(page: u64) -> String {
    format!("{API}/account/{ACCOUNT}/images/{page}")
}

pub fn image_url(id: &str) -> String {
    format!("https://i.test/{id}.png")
}

/// Online pipeline storing everything under `root`.
pub fn pipeline<'a>(transport: &'a FakeTransport, root: &Path) -> Pipeline<&'a FakeTransport> {
    let images = root.join("images");
    Pipeline::online(
        store(root),
        &images,
        CatalogClient::new(transport, API, ACCOUNT, "test-client"),
        ContentFetcher::new(transport, &images),
    )
}

pub fn store(root: &Path) -> MetadataStore {
    MetadataStore::new(root.join("images_data.json"))
}
