use ogserve_core::config::RuntimeConfig;
use ogserve_core::news::{FileNewsStore, NewsStore};
use ogserve_core::notify::{Notifier, NotifyLevel, WARNINGS_CHANNEL};
use ogserve_core::render::OgImageService;
use ogserve_core::resources::SWEEP_INTERVAL;
use ogserve_core::workspace::Workspace;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// How often the store reachability flag is refreshed.
const STORE_RECHECK_INTERVAL: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Readiness
// ---------------------------------------------------------------------------

/// The two facts the health endpoint reports. Written by startup and the
/// background recheck, read by every probe; the endpoint itself never probes
/// anything.
#[derive(Debug, Default)]
pub struct Readiness {
    workspace: AtomicBool,
    store: AtomicBool,
}

#[derive(Debug, Serialize)]
pub struct ReadinessReport {
    pub status: &'static str,
    pub workspace: bool,
    pub store: bool,
}

impl Readiness {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_workspace(&self, ready: bool) {
        self.workspace.store(ready, Ordering::Relaxed);
    }

    pub fn set_store(&self, ready: bool) {
        self.store.store(ready, Ordering::Relaxed);
    }

    pub fn workspace(&self) -> bool {
        self.workspace.load(Ordering::Relaxed)
    }

    pub fn store(&self) -> bool {
        self.store.load(Ordering::Relaxed)
    }

    pub fn is_ready(&self) -> bool {
        self.workspace() && self.store()
    }

    pub fn report(&self) -> ReadinessReport {
        let workspace = self.workspace();
        let store = self.store();
        ReadinessReport {
            status: if workspace && store { "ok" } else { "unavailable" },
            workspace,
            store,
        }
    }
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RuntimeConfig>,
    pub readiness: Arc<Readiness>,
    pub store: Arc<dyn NewsStore>,
    pub cards: Arc<OgImageService>,
    pub notifier: Arc<Notifier>,
}

impl AppState {
    pub fn new(config: RuntimeConfig) -> Self {
        let client = reqwest::Client::new();
        let readiness = Arc::new(Readiness::new());

        // Both readiness facts are established synchronously so the first
        // probe after boot sees the truth, not a default.
        match Workspace::from_config(&config).prepare() {
            Ok(()) => readiness.set_workspace(true),
            Err(e) => {
                tracing::error!(error = %e, "workspace preparation failed");
            }
        }
        readiness.set_store(config.news_dir.is_dir());

        let store: Arc<dyn NewsStore> = Arc::new(FileNewsStore::new(config.news_dir.clone()));
        let cards = Arc::new(OgImageService::from_config(&config, client.clone()));
        let notifier = Arc::new(Notifier::from_config(&config, client));

        let state = Self {
            config: Arc::new(config),
            readiness,
            store,
            cards,
            notifier,
        };

        // Guard: only spawn if inside a Tokio runtime (skipped in sync unit tests).
        if tokio::runtime::Handle::try_current().is_ok() {
            state.spawn_store_recheck();
            state.spawn_asset_sweep();
        }

        state
    }

    /// Keep the store flag honest while running; a news directory that
    /// disappears flips the instance not-ready within one interval.
    fn spawn_store_recheck(&self) {
        let store = self.store.clone();
        let readiness = self.readiness.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(STORE_RECHECK_INTERVAL).await;
                let reachable = store.is_reachable().await;
                let was = readiness.store();
                readiness.set_store(reachable);
                if was && !reachable {
                    tracing::warn!("news store became unreachable");
                } else if !was && reachable {
                    tracing::info!("news store is reachable again");
                }
            }
        });
    }

    fn spawn_asset_sweep(&self) {
        let assets = self.cards.asset_catalog();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(SWEEP_INTERVAL).await;
                let dropped = assets.sweep().await;
                if dropped > 0 {
                    tracing::debug!(dropped, "expired cached assets");
                }
            }
        });
    }

    /// Fire-and-forget operational alert. Card serving never waits on Slack
    /// and never fails because of it.
    pub fn alert(&self, level: NotifyLevel, message: String, details: Option<String>) {
        if !self.notifier.has_channel(WARNINGS_CHANNEL) {
            return;
        }
        // Guard: only spawn if inside a Tokio runtime (skipped in sync unit tests).
        if tokio::runtime::Handle::try_current().is_err() {
            return;
        }
        let notifier = self.notifier.clone();
        tokio::spawn(async move {
            if let Err(e) = notifier
                .send(WARNINGS_CHANNEL, level, &message, details.as_deref())
                .await
            {
                tracing::warn!(error = %e, "alert delivery failed");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> RuntimeConfig {
        RuntimeConfig {
            root: dir.path().to_path_buf(),
            news_dir: dir.path().join("assets/news"),
            ..RuntimeConfig::default()
        }
    }

    #[test]
    fn readiness_report_reflects_flags() {
        let r = Readiness::new();
        assert!(!r.is_ready());
        let report = r.report();
        assert_eq!(report.status, "unavailable");

        r.set_workspace(true);
        assert!(!r.is_ready());
        r.set_store(true);
        assert!(r.is_ready());
        let report = r.report();
        assert_eq!(report.status, "ok");
        assert!(report.workspace);
        assert!(report.store);
    }

    #[test]
    fn readiness_report_serializes_flags() {
        let r = Readiness::new();
        r.set_workspace(true);
        let json = serde_json::to_value(r.report()).unwrap();
        assert_eq!(json["status"], "unavailable");
        assert_eq!(json["workspace"], true);
        assert_eq!(json["store"], false);
    }

    #[test]
    fn new_state_prepares_workspace() {
        let dir = TempDir::new().unwrap();
        let state = AppState::new(config_in(&dir));
        assert!(dir.path().join("generated").is_dir());
        assert!(dir.path().join("assets").is_dir());
        assert!(state.readiness.workspace());
    }

    #[test]
    fn store_flag_follows_news_dir_presence() {
        let dir = TempDir::new().unwrap();
        let state = AppState::new(config_in(&dir));
        // assets/news does not exist yet
        assert!(!state.readiness.store());

        std::fs::create_dir_all(dir.path().join("assets/news")).unwrap();
        let state = AppState::new(config_in(&dir));
        assert!(state.readiness.store());
    }

    #[test]
    fn alert_without_channel_is_a_no_op() {
        let dir = TempDir::new().unwrap();
        let state = AppState::new(config_in(&dir));
        state.alert(NotifyLevel::Warning, "store down".to_string(), None);
    }
}
