use std::sync::Arc;
use std::time::Duration;

use crate::cache::TaskCacheController;
use crate::config::AppConfig;
use crate::confirm::ConfirmPrompt;
use crate::credentials::CredentialStore;
use crate::notify::Notifier;
use crate::remote::TaskService;
use crate::session::{SessionManager, SessionStatus};
use crate::stats::StatsAggregator;

/// Collaborators the core components are wired against.
#[derive(Clone)]
pub struct Services {
    pub service: Arc<dyn TaskService>,
    pub credentials: Arc<dyn CredentialStore>,
    pub confirm: Arc<dyn ConfirmPrompt>,
    pub notifier: Arc<dyn Notifier>,
}

#[async_trait::async_trait]
pub trait ServicesFactory: Send + Sync {
    async fn build_services(&self, cfg: &AppConfig) -> anyhow::Result<Services>;
}

/// One per process. Owns the session, the stats and the task cache; every
/// consumer borrows it.
#[derive(Clone)]
pub struct AppContext {
    cfg: AppConfig,
    session: SessionManager,
    stats: StatsAggregator,
    tasks: TaskCacheController,
}

impl AppContext {
    pub fn new(cfg: AppConfig, services: Services) -> Self {
        let Services {
            service,
            credentials,
            confirm,
            notifier,
        } = services;

        let session = SessionManager::new(service.clone(), credentials, notifier.clone());
        let stats = StatsAggregator::new(service.clone(), session.clone());
        let tasks = TaskCacheController::new(
            service,
            session.clone(),
            stats.clone(),
            confirm,
            notifier,
            Duration::from_millis(cfg.sync.search_debounce_ms),
        );

        Self {
            cfg,
            session,
            stats,
            tasks,
        }
    }

    pub async fn with_factory(
        cfg: AppConfig,
        factory: &dyn ServicesFactory,
    ) -> anyhow::Result<Self> {
        let services = factory.build_services(&cfg).await?;
        Ok(Self::new(cfg, services))
    }

    pub fn cfg(&self) -> &AppConfig {
        &self.cfg
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn stats(&self) -> &StatsAggregator {
        &self.stats
    }

    pub fn tasks(&self) -> &TaskCacheController {
        &self.tasks
    }

    /// Resolves stored credentials and, when that yields a user, fetches the
    /// initial stats snapshot.
    pub async fn start(&self) -> SessionStatus {
        let status = self.session.resolve().await;
        if status == SessionStatus::Authenticated {
            self.stats.refresh().await;
        }
        status
    }

    /// Logs out and drops everything cached for the previous user.
    pub async fn logout(&self) {
        self.session.logout().await;
        self.tasks.clear().await;
        self.stats.reset().await;
    }
}
