//! Dependency-ordered bootstrap loading.
//!
//! A bootstrap sequence is a list of [`Resource`]s processed in batches: every
//! script and style up to the next gate starts loading at once, the batch is
//! awaited as a whole, then the gate is polled until it passes.

pub mod assets;
pub mod host;
pub mod poll;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use futures::future::{self, BoxFuture, FutureExt};
use crate::loader::host::{Host, ScriptLoad};
use crate::loader::poll::poll_until;

pub type Predicate = Arc<dyn Fn() -> bool + Send + Sync>;

#[derive(Clone)]
pub enum Resource {
    Script(String),
    Style(String),
    Gate(Predicate),
}

impl Resource {
    pub fn script(url: impl Into<String>) -> Self {
        Resource::Script(url.into())
    }

    pub fn style(url: impl Into<String>) -> Self {
        Resource::Style(url.into())
    }

    pub fn gate<F>(predicate: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        Resource::Gate(Arc::new(predicate))
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Script(url) => f.debug_tuple("Script").field(url).finish(),
            Resource::Style(url) => f.debug_tuple("Style").field(url).finish(),
            Resource::Gate(_) => f.write_str("Gate"),
        }
    }
}

pub struct ResourceLoader<H: ?Sized> {
    host: Arc<H>,
    interval: Duration,
}

impl<H: Host + ?Sized> ResourceLoader<H> {
    pub fn new(host: Arc<H>, interval: Duration) -> Self {
        Self { host, interval }
    }

    /// Walk the sequence to its end. Never fails; an unreachable resource or a
    /// gate that stays false keeps this future pending.
    pub async fn run(&self, resources: Vec<Resource>) {
        let mut rest = resources.as_slice();

        while !rest.is_empty() {
            if !self.host.head_available() {
                tracing::trace!("Mount target not available yet, retrying step");
                tokio::time::sleep(self.interval).await;
                continue;
            }

            let mut pending = Vec::new();
            let mut gate = None;
            let mut consumed = 0;
            for resource in rest {
                consumed += 1;
                match resource {
                    Resource::Script(url) => pending.push(self.load_script(url)),
                    Resource::Style(url) => pending.push(self.load_style(url)),
                    Resource::Gate(predicate) => {
                        gate = Some(predicate.clone());
                        break;
                    }
                }
            }
            rest = &rest[consumed..];

            future::join_all(pending).await;

            if let Some(predicate) = gate {
                poll_until(self.interval, || predicate()).await;
            }
        }

        tracing::debug!("Bootstrap sequence complete");
    }

    fn load_script(&self, url: &str) -> BoxFuture<'static, ()> {
        tracing::debug!("Loading script {}", url);
        let url = url.to_string();
        match self.host.append_script(&url) {
            ScriptLoad::Event(loaded) => async move {
                if loaded.await.is_err() {
                    tracing::debug!("Script {} will never finish loading", url);
                    future::pending::<()>().await;
                }
            }
            .boxed(),
            ScriptLoad::Polled(state) => {
                let interval = self.interval;
                async move { poll_until(interval, || state().is_ready()).await }.boxed()
            }
        }
    }

    fn load_style(&self, url: &str) -> BoxFuture<'static, ()> {
        tracing::debug!("Loading style {}", url);
        let sheet = self.host.append_style(url);
        let interval = self.interval;
        async move { poll_until(interval, || sheet()).await }.boxed()
    }
}
