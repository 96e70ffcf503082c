//! One module per `vt` subcommand, plus the shared invocation context.

pub mod admin;
pub mod completions;
pub mod lookup;
pub mod review;
pub mod reviewer;
pub mod search;
pub mod users;

use anyhow::{Context as _, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use vetter_core::backend::{AdminBackend, Fixture, HttpBackend, MemoryBackend, ReviewBackend};
use vetter_core::config::{self, EffectiveConfig};
use vetter_core::prefs::TomlFileStore;

use crate::output::OutputMode;

/// Backends for one invocation: the HTTP server, or an offline fixture.
pub struct Remote {
    pub review: Arc<dyn ReviewBackend>,
    pub admin: Arc<dyn AdminBackend>,
    /// Where requests go, for headers and logs.
    pub label: String,
}

/// Resolved global flags and configuration.
pub struct Context {
    pub config: EffectiveConfig,
    pub output: OutputMode,
    pub offline: Option<PathBuf>,
}

impl Context {
    pub fn load(server: Option<&str>, json: bool, offline: Option<PathBuf>) -> Result<Self> {
        let config = config::resolve_config(server, json)?;
        let output = OutputMode::from_resolved(&config.resolved_output);
        Ok(Self {
            config,
            output,
            offline,
        })
    }

    /// Time one-shot commands wait for background lookups.
    pub const fn settle_timeout(&self) -> Duration {
        Duration::from_secs(self.config.config.server.timeout_secs.saturating_add(1))
    }

    pub fn remote(&self) -> Result<Remote> {
        if let Some(path) = &self.offline {
            let fixture = Fixture::load(path)?;
            tracing::debug!(
                path = %path.display(),
                items = fixture.items.len(),
                classifications = fixture.classifications.len(),
                "using offline fixture"
            );
            let backend = Arc::new(MemoryBackend::new(fixture));
            return Ok(Remote {
                review: backend.clone(),
                admin: backend,
                label: format!("offline:{}", path.display()),
            });
        }

        let server = &self.config.config.server;
        let backend = Arc::new(HttpBackend::new(&self.config.base_url, server.timeout()));
        tracing::debug!(base_url = %backend.base_url(), "using review server");
        Ok(Remote {
            label: backend.base_url().to_string(),
            review: backend.clone(),
            admin: backend,
        })
    }

    pub fn prefs_store(&self) -> Result<TomlFileStore> {
        let dir = config::config_dir()
            .context("no config directory available; set VETTER_CONFIG_DIR")?;
        Ok(TomlFileStore::in_dir(&dir))
    }
}
