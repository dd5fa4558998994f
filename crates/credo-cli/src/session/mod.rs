//! Composition root: the credential store and everything built on it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::TimeDelta;
use directories::ProjectDirs;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::debug;

use credo_core::{
    CoordinatorConfig, RefreshCoordinator, RequestGateway, ServiceUrl, SessionEvent, UserId,
};
use credo_file::FileCredentialStore;
use credo_http::{AuthedClient, BackendClient, HttpClient, HttpTokenExchange, WebhookClient};

use crate::cli::Settings;

/// Everything a command needs, wired once per invocation.
pub struct Services {
    coordinator: RefreshCoordinator,
    http: HttpClient,
    backend: ServiceUrl,
    webhook_url: Option<String>,
    data_dir: PathBuf,
}

impl Services {
    pub fn open(settings: &Settings) -> Result<Self> {
        let data_dir = match &settings.data_dir {
            Some(dir) => dir.clone(),
            None => default_data_dir()?,
        };
        debug!(data_dir = %data_dir.display(), "Using credential directory");

        let backend = ServiceUrl::new(&settings.backend_url).context("Invalid backend URL")?;
        let http = HttpClient::new().context("Failed to create HTTP client")?;

        let store = Arc::new(FileCredentialStore::new(&data_dir));
        let exchange = Arc::new(HttpTokenExchange::new(http.clone(), backend.clone()));
        let refresh_buffer = TimeDelta::try_seconds(settings.refresh_buffer_secs)
            .context("--refresh-buffer-secs is out of range")?;
        let config = CoordinatorConfig::default().with_refresh_buffer(refresh_buffer);

        Ok(Self {
            coordinator: RefreshCoordinator::new(store, exchange, config),
            http,
            backend,
            webhook_url: settings.webhook_url.clone(),
            data_dir,
        })
    }

    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.coordinator
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn backend(&self) -> BackendClient {
        BackendClient::new(self.http.clone(), self.backend.clone())
    }

    /// The chat webhook client. Fails if no webhook URL is configured.
    pub fn webhook(&self) -> Result<WebhookClient> {
        let url = self
            .webhook_url
            .as_deref()
            .context("No webhook configured. Pass --webhook-url or set CREDO_WEBHOOK_URL.")?;
        let url = ServiceUrl::new(url).context("Invalid webhook URL")?;

        let gateway = RequestGateway::new(self.coordinator.clone());
        Ok(WebhookClient::new(AuthedClient::new(self.http.clone(), gateway), url))
    }

    /// Start listening for the session ending underneath a command.
    pub fn watch_expiry(&self) -> ExpiryWatch {
        ExpiryWatch {
            events: self.coordinator.subscribe(),
        }
    }
}

/// Collects [`SessionEvent::Expired`] so the shell can ask for a new sign-in.
pub struct ExpiryWatch {
    events: broadcast::Receiver<SessionEvent>,
}

impl ExpiryWatch {
    /// Returns the user whose session expired since the watch started.
    pub fn expired(&mut self) -> Option<UserId> {
        let mut expired = None;
        loop {
            match self.events.try_recv() {
                Ok(SessionEvent::Expired { user_id }) => expired = Some(user_id),
                Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty | TryRecvError::Closed) => return expired,
            }
        }
    }
}

fn default_data_dir() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "credo").context("Could not determine data directory")?;
    Ok(dirs.data_dir().to_path_buf())
}
