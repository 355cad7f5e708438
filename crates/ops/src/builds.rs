//! Build submission and single-shot status queries

use crate::context::OpsCtx;
use crate::service::BuildService;
use cmbuild_errors::{ApiError, Error, UserFacingError};
use cmbuild_events::{AppEvent, BuildEvent, EventEmitter};
use cmbuild_types::{Build, BuildCreated, BuildId, BuildRequest};
use std::collections::HashMap;

/// The only status the service uses to acknowledge a new build
const CREATED: u16 = 201;

/// Submit a build of `workflow_id` on `branch` for an application
///
/// # Errors
///
/// Any status other than 201 yields the classified API error carrying the
/// response body. A 201 without a usable `buildId` yields
/// [`ApiError::UnexpectedResponse`].
pub async fn submit_build<S: BuildService>(
    ctx: &OpsCtx<S>,
    app_id: &str,
    workflow_id: &str,
    branch: &str,
) -> Result<BuildId, Error> {
    ctx.emit(AppEvent::Build(BuildEvent::Submitting {
        app_id: app_id.to_string(),
        workflow_id: workflow_id.to_string(),
        branch: branch.to_string(),
    }));

    let request = BuildRequest {
        app_id: app_id.to_string(),
        workflow_id: workflow_id.to_string(),
        branch: branch.to_string(),
    };

    let response = ctx.service.create_build(&request).await?;
    if response.status != CREATED {
        return Err(response.into_error());
    }

    let created: BuildCreated = response.json()?;
    let build_id = created
        .build_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::UnexpectedResponse {
            message: format!("created response without buildId: {}", response.body),
        })?;

    ctx.emit(AppEvent::Build(BuildEvent::Submitted {
        build_id: build_id.clone(),
        dashboard_url: Some(ctx.dashboard_link(app_id, &build_id)),
    }));

    Ok(build_id)
}

/// Fetch the current state of a build
///
/// Returns `None` for any non-success response, transport failure or
/// undecodable body. The reason goes out as a debug event.
pub async fn poll_build_status<S: BuildService>(ctx: &OpsCtx<S>, build_id: &str) -> Option<Build> {
    match fetch_build(ctx, build_id).await {
        Ok(build) => Some(build),
        Err(e) => {
            let mut context = HashMap::new();
            context.insert("build_id".to_string(), build_id.to_string());
            if let Some(code) = e.user_code() {
                context.insert("code".to_string(), code.to_string());
            }
            ctx.emit_debug_with_context(format!("build poll failed: {e}"), context);
            None
        }
    }
}

/// Single fetch with the failure reason kept
pub(crate) async fn fetch_build<S: BuildService>(
    ctx: &OpsCtx<S>,
    build_id: &str,
) -> Result<Build, Error> {
    let response = ctx.service.get_build(build_id).await?;
    if !response.is_success() {
        return Err(response.into_error());
    }

    let mut build: Build = response.json()?;
    if build.id.is_empty() {
        build.id = build_id.to_string();
    }
    Ok(build)
}
