//! Application lookup and workflow listing

use crate::context::OpsCtx;
use crate::service::BuildService;
use cmbuild_errors::{ApiError, Error};
use cmbuild_events::{AppEvent, ApplicationEvent, EventEmitter, WorkflowEntry};
use cmbuild_types::{
    find_application, ApplicationDetail, ApplicationId, ApplicationList, Workflow, WorkflowId,
};
use std::collections::BTreeMap;

/// Resolve an application identifier from a fragment of its display name
///
/// The match is a case-insensitive substring test; the first matching
/// application in the service's listing wins.
///
/// # Errors
///
/// Returns [`ApiError::NotFound`] if nothing matches, or the classified
/// API error if the listing is not a success response.
pub async fn resolve_application<S: BuildService>(
    ctx: &OpsCtx<S>,
    name_fragment: &str,
) -> Result<ApplicationId, Error> {
    ctx.emit(AppEvent::Application(ApplicationEvent::ListRequested));

    let response = ctx.service.list_applications().await?;
    if !response.is_success() {
        return Err(response.into_error());
    }

    let list: ApplicationList = response.json()?;
    ctx.emit(AppEvent::Application(ApplicationEvent::ListFetched {
        count: list.applications.len(),
    }));

    let app = find_application(&list.applications, name_fragment)
        .ok_or_else(|| ApiError::application_not_found(name_fragment))?;

    ctx.emit(AppEvent::Application(ApplicationEvent::Resolved {
        query: name_fragment.to_string(),
        app_id: app.id.clone(),
        app_name: app.name.clone(),
    }));

    Ok(app.id.clone())
}

/// Fetch the workflow definitions of an application
///
/// An application without workflows yields an empty map.
///
/// # Errors
///
/// Returns the classified API error on a non-success response.
pub async fn list_workflows<S: BuildService>(
    ctx: &OpsCtx<S>,
    app_id: &str,
) -> Result<BTreeMap<WorkflowId, Workflow>, Error> {
    let response = ctx.service.get_application(app_id).await?;
    if !response.is_success() {
        return Err(response.into_error());
    }

    let detail: ApplicationDetail = response.json()?;

    ctx.emit(AppEvent::Application(ApplicationEvent::WorkflowsListed {
        app_id: app_id.to_string(),
        workflows: detail
            .workflows
            .iter()
            .map(|(id, workflow)| WorkflowEntry {
                id: id.clone(),
                name: workflow.display_name().to_string(),
            })
            .collect(),
    }));

    Ok(detail.workflows)
}
