use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use taskdeck_core::api::{
    AppConfig, ConfirmPrompt, CredentialStore, Notifier, Services, ServicesFactory, StaticConfirm,
    TaskService,
};
use taskdeck_core::config::get_taskdeck_data_dir;

use crate::credentials::FileCredentialStore;
use crate::http::HttpTaskService;
use crate::notify::ConsoleNotifier;
use crate::prompt::StdinConfirm;

pub fn build_service(cfg: &AppConfig) -> Result<Arc<dyn TaskService>> {
    Ok(Arc::new(HttpTaskService::new(
        &cfg.api.base_url,
        cfg.api.timeout_ms,
    )?))
}

pub fn build_credentials(cfg: &AppConfig) -> Result<Arc<dyn CredentialStore>> {
    let path = match cfg.credentials.path.as_deref().map(str::trim) {
        Some(p) if !p.is_empty() => PathBuf::from(p),
        _ => get_taskdeck_data_dir()?.join("token"),
    };
    Ok(Arc::new(FileCredentialStore::new(path)))
}

pub fn build_confirm(assume_yes: bool) -> Arc<dyn ConfirmPrompt> {
    if assume_yes {
        Arc::new(StaticConfirm(true))
    } else {
        Arc::new(StdinConfirm)
    }
}

/// Wires the HTTP service, the token file, a console notifier and a stdin
/// (or `--yes`) confirmation prompt.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardServicesFactory {
    pub assume_yes: bool,
    pub color: bool,
}

#[async_trait::async_trait]
impl ServicesFactory for StandardServicesFactory {
    async fn build_services(&self, cfg: &AppConfig) -> Result<Services> {
        let notifier: Arc<dyn Notifier> = Arc::new(ConsoleNotifier::new(self.color));
        Ok(Services {
            service: build_service(cfg)?,
            credentials: build_credentials(cfg)?,
            confirm: build_confirm(self.assume_yes),
            notifier,
        })
    }
}
