use std::sync::Arc;
use crate::config::{resolve_url, BootstrapConfig, ResourceEntry};
use crate::loader::host::Host;
use crate::loader::{Predicate, Resource, ResourceLoader};

/// The configured bootstrap sequence with URLs resolved against `root`.
pub fn primary_sequence(root: &str, config: &BootstrapConfig) -> Vec<Resource> {
    config
        .resources
        .iter()
        .map(|entry| match entry {
            ResourceEntry::Script(url) => Resource::script(resolve_url(root, url)),
            ResourceEntry::Style(url) => Resource::style(resolve_url(root, url)),
        })
        .collect()
}

/// Load the page's dependencies. If the UI library did not arrive with the
/// primary sequence, load it from its fallback source and wait until it is
/// usable. Returns once the page is ready for data.
pub async fn run<H: Host + ?Sized>(
    host: Arc<H>,
    root: &str,
    config: &BootstrapConfig,
    library_present: Predicate,
) {
    let loader = ResourceLoader::new(host, config.poll_interval());

    loader.run(primary_sequence(root, config)).await;

    if library_present() {
        tracing::debug!("UI library {} already present", config.ui_library.name);
    } else {
        let fallback = resolve_url(root, &config.ui_library.fallback_url);
        tracing::info!("UI library {} missing, loading {}", config.ui_library.name, fallback);
        loader
            .run(vec![Resource::script(fallback), Resource::Gate(library_present)])
            .await;
    }

    tracing::info!("Bootstrap complete");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use crate::config::UiLibraryConfig;
    use crate::loader::host::{ReadyState, ScriptLoad, SheetProbe};

    /// Every resource is ready as soon as it is installed.
    #[derive(Default)]
    struct InstantHost {
        installed: Mutex<Vec<String>>,
    }

    impl InstantHost {
        fn installed(&self) -> Vec<String> {
            self.installed.lock().unwrap().clone()
        }
    }

    impl Host for InstantHost {
        fn head_available(&self) -> bool {
            true
        }

        fn append_script(&self, url: &str) -> ScriptLoad {
            self.installed.lock().unwrap().push(url.to_string());
            ScriptLoad::Polled(Arc::new(|| ReadyState::Loaded))
        }

        fn append_style(&self, url: &str) -> SheetProbe {
            self.installed.lock().unwrap().push(url.to_string());
            Arc::new(|| true)
        }
    }

    fn config(resources: Vec<ResourceEntry>) -> BootstrapConfig {
        BootstrapConfig {
            resources,
            poll_interval_ms: 10,
            ui_library: UiLibraryConfig {
                name: "jquery".to_string(),
                fallback_url: "//cdn.example/jquery.min.js".to_string(),
            },
        }
    }

    fn library_loaded(host: &Arc<InstantHost>) -> Predicate {
        let host = host.clone();
        Arc::new(move || host.installed().iter().any(|url| url.contains("jquery")))
    }

    #[test]
    fn test_primary_sequence_resolves_urls() {
        let sequence = primary_sequence(
            "https://servers.example/",
            &config(vec![
                ResourceEntry::Style("style.css".to_string()),
                ResourceEntry::Script("servers.js".to_string()),
            ]),
        );

        let urls: Vec<String> = sequence.iter().map(|r| format!("{:?}", r)).collect();
        assert_eq!(
            urls,
            vec![
                r#"Style("https://servers.example/style.css")"#,
                r#"Script("https://servers.example/servers.js")"#,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_loads_fallback_when_library_missing() {
        let host = Arc::new(InstantHost::default());
        let config = config(vec![ResourceEntry::Style("style.css".to_string())]);

        run(host.clone(), "https://servers.example/", &config, library_loaded(&host)).await;

        assert_eq!(
            host.installed(),
            vec![
                "https://servers.example/style.css",
                "https://cdn.example/jquery.min.js",
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_skips_fallback_when_library_bundled() {
        let host = Arc::new(InstantHost::default());
        let config = config(vec![
            ResourceEntry::Style("style.css".to_string()),
            ResourceEntry::Script("vendor/jquery-3.7.1.js".to_string()),
        ]);

        run(host.clone(), "https://servers.example/", &config, library_loaded(&host)).await;

        assert_eq!(host.installed().len(), 2);
        assert!(!host.installed().iter().any(|url| url.contains("cdn.example")));
    }
}
