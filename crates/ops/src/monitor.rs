//! Polling a build until it reaches a terminal status

use crate::builds::fetch_build;
use crate::context::OpsCtx;
use crate::service::BuildService;
use cmbuild_config::MonitorConfig;
use cmbuild_errors::{Error, MonitorError, UserFacingError};
use cmbuild_events::{AppEvent, BuildEvent, EventEmitter};
use cmbuild_types::{Build, BuildStatus};
use std::time::{Duration, Instant};

/// Exponent cap for the failure backoff
const MAX_BACKOFF_EXPONENT: u32 = 32;

/// How [`await_completion`] paces and bounds its polling
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorOptions {
    /// Delay between successful polls
    pub poll_interval: Duration,
    /// Give up after this many polls; `None` polls forever
    pub max_polls: Option<u32>,
    /// Growth factor of the delay per consecutive failed poll
    pub backoff_multiplier: f64,
    /// Upper bound for the grown delay
    pub max_backoff: Duration,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self::from(&MonitorConfig::default())
    }
}

impl From<&MonitorConfig> for MonitorOptions {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            max_polls: config.max_polls,
            backoff_multiplier: config.backoff_multiplier,
            max_backoff: config.max_backoff(),
        }
    }
}

impl MonitorOptions {
    /// Delay before the next poll after `failures` consecutive failed polls.
    ///
    /// Zero failures gives the plain interval. The grown delay never exceeds
    /// `max_backoff`, and never drops below the interval.
    #[must_use]
    pub fn delay_after_failures(&self, failures: u32) -> Duration {
        if failures == 0 {
            return self.poll_interval;
        }

        let cap = self.max_backoff.max(self.poll_interval);
        let exponent = i32::try_from(failures.min(MAX_BACKOFF_EXPONENT)).unwrap_or(i32::MAX);
        let secs = self.poll_interval.as_secs_f64() * self.backoff_multiplier.max(1.0).powi(exponent);

        if !secs.is_finite() || secs >= cap.as_secs_f64() {
            cap
        } else {
            Duration::from_secs_f64(secs).max(self.poll_interval)
        }
    }
}

/// Poll a build until its status is terminal
///
/// A [`BuildEvent::StatusChanged`] event goes out only when the observed
/// status differs from the previous observation. Failed polls are not
/// errors: the loop backs off and tries again.
///
/// # Errors
///
/// Returns [`MonitorError::PollLimitExceeded`] when `max_polls` polls pass
/// without a terminal status.
pub async fn await_completion<S: BuildService>(
    ctx: &OpsCtx<S>,
    build_id: &str,
    options: &MonitorOptions,
) -> Result<Build, Error> {
    let started = Instant::now();
    ctx.emit(AppEvent::Build(BuildEvent::MonitorStarted {
        build_id: build_id.to_string(),
        poll_interval_secs: options.poll_interval.as_secs(),
        max_polls: options.max_polls,
    }));

    let mut last_status: Option<BuildStatus> = None;
    let mut polls: u32 = 0;
    let mut consecutive_failures: u32 = 0;

    loop {
        polls = polls.saturating_add(1);

        let delay = match fetch_build(ctx, build_id).await {
            Ok(build) => {
                consecutive_failures = 0;

                if build.status != last_status {
                    ctx.emit(AppEvent::Build(BuildEvent::StatusChanged {
                        build_id: build_id.to_string(),
                        status: build.status_str().to_string(),
                        elapsed_secs: started.elapsed().as_secs(),
                    }));
                    last_status.clone_from(&build.status);
                }

                if build.is_terminal() {
                    ctx.emit(AppEvent::Build(BuildEvent::Completed {
                        build_id: build_id.to_string(),
                        status: build.status_str().to_string(),
                        elapsed_secs: started.elapsed().as_secs(),
                    }));
                    return Ok(build);
                }

                options.poll_interval
            }
            Err(e) => {
                consecutive_failures = consecutive_failures.saturating_add(1);
                let delay = options.delay_after_failures(consecutive_failures);
                ctx.emit(AppEvent::Build(BuildEvent::PollFailed {
                    build_id: build_id.to_string(),
                    reason: e.user_message().into_owned(),
                    consecutive_failures,
                    next_delay_ms: u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                }));
                delay
            }
        };

        if options.max_polls.is_some_and(|max| polls >= max) {
            return Err(MonitorError::PollLimitExceeded {
                build_id: build_id.to_string(),
                polls,
                last_status: last_status.map(String::from),
            }
            .into());
        }

        tokio::time::sleep(delay).await;
    }
}
