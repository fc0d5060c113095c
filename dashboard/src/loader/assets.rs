use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use reqwest::Client;
use tokio::sync::oneshot;
use anyhow::{Context, Result};
use crate::loader::host::{Host, ScriptLoad, SheetProbe};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Script,
    Style,
}

impl AssetKind {
    pub fn content_type(self) -> &'static str {
        match self {
            AssetKind::Script => "text/javascript; charset=utf-8",
            AssetKind::Style => "text/css; charset=utf-8",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Asset {
    pub id: usize,
    pub kind: AssetKind,
    pub url: String,
    /// `None` until the download finished
    pub body: Option<Arc<str>>,
}

#[derive(Default)]
struct AssetTable {
    attached: AtomicBool,
    assets: RwLock<Vec<Asset>>,
}

impl AssetTable {
    fn register(&self, kind: AssetKind, url: &str) -> usize {
        let mut assets = self.assets.write().unwrap_or_else(|e| e.into_inner());
        let id = assets.len();
        assets.push(Asset {
            id,
            kind,
            url: url.to_string(),
            body: None,
        });
        id
    }

    fn complete(&self, id: usize, body: String) {
        let mut assets = self.assets.write().unwrap_or_else(|e| e.into_inner());
        if let Some(asset) = assets.get_mut(id) {
            asset.body = Some(body.into());
        }
    }

    fn is_loaded(&self, id: usize) -> bool {
        let assets = self.assets.read().unwrap_or_else(|e| e.into_inner());
        assets.get(id).is_some_and(|asset| asset.body.is_some())
    }
}

/// Downloads bootstrap assets and keeps them for the page shell to link to.
///
/// The page head counts as available once [`AssetStore::attach`] has been
/// called, which happens after the HTTP listener is bound.
#[derive(Clone)]
pub struct AssetStore {
    client: Client,
    table: Arc<AssetTable>,
}

impl AssetStore {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .context("Failed to build asset HTTP client")?;

        Ok(Self {
            client,
            table: Arc::new(AssetTable::default()),
        })
    }

    pub fn attach(&self) {
        self.table.attached.store(true, Ordering::SeqCst);
    }

    /// Assets whose download has finished, in installation order.
    pub fn loaded(&self) -> Vec<Asset> {
        let assets = self.table.assets.read().unwrap_or_else(|e| e.into_inner());
        assets.iter().filter(|asset| asset.body.is_some()).cloned().collect()
    }

    /// Kind and contents of a loaded asset.
    pub fn body(&self, id: usize) -> Option<(AssetKind, Arc<str>)> {
        let assets = self.table.assets.read().unwrap_or_else(|e| e.into_inner());
        let asset = assets.get(id)?;
        asset.body.clone().map(|body| (asset.kind, body))
    }

    /// Whether a loaded script's file name mentions `name`, e.g. `jquery`.
    pub fn has_script(&self, name: &str) -> bool {
        let name = name.to_ascii_lowercase();
        let assets = self.table.assets.read().unwrap_or_else(|e| e.into_inner());
        assets.iter().any(|asset| {
            asset.kind == AssetKind::Script
                && asset.body.is_some()
                && file_name(&asset.url).to_ascii_lowercase().contains(&name)
        })
    }

    fn spawn_fetch(&self, id: usize, url: String, loaded: Option<oneshot::Sender<()>>) {
        let client = self.client.clone();
        let table = self.table.clone();
        tokio::spawn(async move {
            match fetch_text(&client, &url).await {
                Ok(body) => {
                    tracing::debug!("Fetched asset {} ({} bytes)", url, body.len());
                    table.complete(id, body);
                    if let Some(loaded) = loaded {
                        let _ = loaded.send(());
                    }
                }
                Err(e) => {
                    // Same as a script tag whose onload never fires.
                    tracing::warn!("Failed to fetch asset {}: {}", url, e);
                }
            }
        });
    }
}

impl Host for AssetStore {
    fn head_available(&self) -> bool {
        self.table.attached.load(Ordering::SeqCst)
    }

    fn append_script(&self, url: &str) -> ScriptLoad {
        let id = self.table.register(AssetKind::Script, url);
        let (tx, rx) = oneshot::channel();
        self.spawn_fetch(id, url.to_string(), Some(tx));
        ScriptLoad::Event(rx)
    }

    fn append_style(&self, url: &str) -> SheetProbe {
        let id = self.table.register(AssetKind::Style, url);
        self.spawn_fetch(id, url.to_string(), None);
        let table = self.table.clone();
        Arc::new(move || table.is_loaded(id))
    }
}

async fn fetch_text(client: &Client, url: &str) -> reqwest::Result<String> {
    client.get(url).send().await?.error_for_status()?.text().await
}

fn file_name(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit('/').next().unwrap_or(path)
}
