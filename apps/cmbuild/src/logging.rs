//! Structured logging integration for events
//!
//! Every event the operations emit is mirrored into `tracing` with
//! structured fields, independent of what the terminal shows.

use cmbuild_events::{AppEvent, ArtifactEvent, BuildEvent, GeneralEvent};
use tracing::{debug, error, info, trace, warn};

/// Log an `AppEvent` at its own level with structured fields
pub fn log_event_with_tracing(event: &AppEvent) {
    let target = event.log_target();

    match event {
        AppEvent::Build(build_event) => match build_event {
            BuildEvent::Submitting {
                app_id,
                workflow_id,
                branch,
            } => {
                info!(
                    target: "cmbuild::events",
                    source = target,
                    app_id = %app_id,
                    workflow_id = %workflow_id,
                    branch = %branch,
                    "Submitting build"
                );
            }
            BuildEvent::Submitted {
                build_id,
                dashboard_url,
            } => {
                info!(
                    target: "cmbuild::events",
                    source = target,
                    build_id = %build_id,
                    dashboard_url = ?dashboard_url,
                    "Build submitted"
                );
            }
            BuildEvent::StatusChanged {
                build_id,
                status,
                elapsed_secs,
            } => {
                info!(
                    target: "cmbuild::events",
                    source = target,
                    build_id = %build_id,
                    status = %status,
                    elapsed_secs = elapsed_secs,
                    "Build status changed"
                );
            }
            BuildEvent::PollFailed {
                build_id,
                reason,
                consecutive_failures,
                next_delay_ms,
            } => {
                debug!(
                    target: "cmbuild::events",
                    source = target,
                    build_id = %build_id,
                    reason = %reason,
                    consecutive_failures = consecutive_failures,
                    next_delay_ms = next_delay_ms,
                    "Build poll failed"
                );
            }
            BuildEvent::Completed {
                build_id,
                status,
                elapsed_secs,
            } => {
                info!(
                    target: "cmbuild::events",
                    source = target,
                    build_id = %build_id,
                    status = %status,
                    elapsed_secs = elapsed_secs,
                    "Build completed"
                );
            }
            BuildEvent::MonitorStarted { .. } => log_fallback(event),
        },

        AppEvent::Artifact(artifact_event) => match artifact_event {
            ArtifactEvent::Saved { name, path, bytes } => {
                info!(
                    target: "cmbuild::events",
                    source = target,
                    name = %name,
                    path = %path.display(),
                    bytes = bytes,
                    "Artifact saved"
                );
            }
            ArtifactEvent::Failed {
                name,
                code,
                message,
            } => {
                warn!(
                    target: "cmbuild::events",
                    source = target,
                    name = %name,
                    code = ?code,
                    message = %message,
                    "Artifact download failed"
                );
            }
            _ => log_fallback(event),
        },

        AppEvent::General(general_event) => match general_event {
            GeneralEvent::Warning { message, context } => {
                warn!(
                    target: "cmbuild::events",
                    source = target,
                    message = %message,
                    context = ?context,
                    "Warning"
                );
            }
            GeneralEvent::DebugLog { message, context } => {
                debug!(
                    target: "cmbuild::events",
                    source = target,
                    message = %message,
                    context = ?context,
                    "Debug log"
                );
            }
            _ => log_fallback(event),
        },

        AppEvent::Application(_) => log_fallback(event),
    }
}

fn log_fallback(event: &AppEvent) {
    let source = event.log_target();
    match event.log_level() {
        tracing::Level::ERROR => {
            error!(target: "cmbuild::events", source, event = ?event, "Application event");
        }
        tracing::Level::WARN => {
            warn!(target: "cmbuild::events", source, event = ?event, "Application event");
        }
        tracing::Level::INFO => {
            info!(target: "cmbuild::events", source, event = ?event, "Application event");
        }
        tracing::Level::DEBUG => {
            debug!(target: "cmbuild::events", source, event = ?event, "Application event");
        }
        tracing::Level::TRACE => {
            trace!(target: "cmbuild::events", source, event = ?event, "Application event");
        }
    }
}
