//! Operations context for dependency injection

use crate::service::BuildService;
use cmbuild_config::Config;
use cmbuild_errors::{Error, OpsError};
use cmbuild_events::{EventEmitter, EventSender};

/// Operations context providing access to the remote service, the event
/// channel and the loaded configuration
pub struct OpsCtx<S> {
    /// Remote build service
    pub service: S,
    /// Event sender for progress reporting
    pub tx: EventSender,
    /// Loaded configuration
    pub config: Config,
}

impl<S: BuildService> OpsCtx<S> {
    // No public constructor - use OpsContextBuilder instead

    /// Web link to a build on the service dashboard
    #[must_use]
    pub fn dashboard_link(&self, app_id: &str, build_id: &str) -> String {
        format!(
            "{}/app/{app_id}/build/{build_id}",
            self.config.api.dashboard_url.trim_end_matches('/')
        )
    }
}

impl<S> EventEmitter for OpsCtx<S> {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(&self.tx)
    }
}

/// Builder for [`OpsCtx`]
pub struct OpsContextBuilder<S> {
    service: Option<S>,
    tx: Option<EventSender>,
    config: Option<Config>,
}

impl<S: BuildService> Default for OpsContextBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: BuildService> OpsContextBuilder<S> {
    /// Create new context builder
    #[must_use]
    pub fn new() -> Self {
        Self {
            service: None,
            tx: None,
            config: None,
        }
    }

    /// Set remote service
    #[must_use]
    pub fn with_service(mut self, service: S) -> Self {
        self.service = Some(service);
        self
    }

    /// Set event sender
    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    /// Set configuration
    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the context
    ///
    /// # Errors
    ///
    /// Returns an error if the service or the event sender is missing.
    /// A missing configuration falls back to defaults.
    pub fn build(self) -> Result<OpsCtx<S>, Error> {
        let service = self.service.ok_or_else(|| OpsError::MissingComponent {
            component: "service".to_string(),
        })?;

        let tx = self.tx.ok_or_else(|| OpsError::MissingComponent {
            component: "event sender".to_string(),
        })?;

        Ok(OpsCtx {
            service,
            tx,
            config: self.config.unwrap_or_default(),
        })
    }
}
