//! The end-to-end flow: resolve, submit, monitor, download

use crate::apps::{list_workflows, resolve_application};
use crate::artifacts::{download_artifacts, DownloadReport};
use crate::builds::submit_build;
use crate::context::OpsCtx;
use crate::monitor::{await_completion, MonitorOptions};
use crate::service::BuildService;
use cmbuild_config::Config;
use cmbuild_errors::{Error, UserFacingError};
use cmbuild_events::EventEmitter;
use cmbuild_types::{ApplicationId, Build, BuildId};
use serde::Serialize;
use std::path::PathBuf;

const OPERATION: &str = "build";

/// Inputs of [`run_full_process`]
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Fragment of the application's display name
    pub app_name: String,
    pub workflow_id: String,
    pub branch: String,
    pub output_dir: PathBuf,
    pub monitor: MonitorOptions,
}

impl RunRequest {
    /// Request built entirely from configuration
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            app_name: config.api.app_name.clone(),
            workflow_id: config.build.workflow.clone(),
            branch: config.build.branch.clone(),
            output_dir: config.output_dir(),
            monitor: MonitorOptions::from(&config.monitor),
        }
    }
}

/// Outcome of a completed run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub app_id: ApplicationId,
    pub build_id: BuildId,
    pub dashboard_url: String,
    /// Build as last observed, with a terminal status
    pub build: Build,
    /// Present only when the build finished
    pub downloads: Option<DownloadReport>,
    pub output_dir: PathBuf,
}

impl RunReport {
    /// Whether the build finished; skipped artifacts do not count against it
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.build.is_finished()
    }
}

/// Resolve the application, submit a build, wait for it and fetch its
/// artifacts
///
/// Steps run strictly in order and the first failing step aborts the rest.
/// Artifacts are downloaded only for a finished build.
///
/// # Errors
///
/// Returns the error of the first step that failed.
pub async fn run_full_process<S: BuildService>(
    ctx: &OpsCtx<S>,
    request: &RunRequest,
) -> Result<RunReport, Error> {
    ctx.emit_operation_started(OPERATION);

    match run_steps(ctx, request).await {
        Ok(report) => {
            ctx.emit_operation_completed(OPERATION, report.succeeded());
            Ok(report)
        }
        Err(e) => {
            ctx.emit_operation_failed(OPERATION, e.user_message());
            Err(e)
        }
    }
}

async fn run_steps<S: BuildService>(
    ctx: &OpsCtx<S>,
    request: &RunRequest,
) -> Result<RunReport, Error> {
    let app_id = resolve_application(ctx, &request.app_name).await?;

    // Listing is informational; the requested workflow is submitted as given
    list_workflows(ctx, &app_id).await?;

    let build_id = submit_build(ctx, &app_id, &request.workflow_id, &request.branch).await?;
    let dashboard_url = ctx.dashboard_link(&app_id, &build_id);

    let build = await_completion(ctx, &build_id, &request.monitor).await?;

    let downloads = if build.is_finished() {
        Some(download_artifacts(ctx, &build, &request.output_dir).await?)
    } else {
        None
    };

    Ok(RunReport {
        app_id,
        build_id,
        dashboard_url,
        build,
        downloads,
        output_dir: request.output_dir.clone(),
    })
}
