//! Artifact retrieval for finished builds

use crate::context::OpsCtx;
use crate::service::BuildService;
use cmbuild_errors::{ArtifactError, Error, UserFacingError};
use cmbuild_events::{AppEvent, ArtifactEvent, EventEmitter};
use cmbuild_types::{Artifact, Build};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Artifact written to disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedArtifact {
    pub name: String,
    pub path: PathBuf,
    pub bytes: u64,
}

/// Artifact that could not be retrieved
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedArtifact {
    /// Artifact name, or a placeholder when the entry had none
    pub name: String,
    pub reason: String,
}

/// Outcome of [`download_artifacts`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DownloadReport {
    pub saved: Vec<SavedArtifact>,
    pub failed: Vec<FailedArtifact>,
}

impl DownloadReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.saved.is_empty() && self.failed.is_empty()
    }
}

/// Download every artifact of a finished build into `output_dir`
///
/// Each artifact lands at `output_dir/<name>`, replacing any existing file.
/// A failed artifact is reported and skipped; its siblings still download.
/// Builds that did not finish are skipped with a warning.
///
/// # Errors
///
/// Only an `output_dir` that cannot be created is an error. Per-artifact
/// failures are collected in the report.
pub async fn download_artifacts<S: BuildService>(
    ctx: &OpsCtx<S>,
    build: &Build,
    output_dir: &Path,
) -> Result<DownloadReport, Error> {
    let mut report = DownloadReport::default();

    if !build.is_finished() {
        ctx.emit_warning_with_context(
            format!(
                "build {} is {}, not downloading artifacts",
                build.id,
                build.status_str()
            ),
            "artifacts are only published for finished builds",
        );
        return Ok(report);
    }

    if build.artifacts.is_empty() {
        ctx.emit(AppEvent::Artifact(ArtifactEvent::NoneAvailable {
            build_id: build.id.clone(),
        }));
        return Ok(report);
    }

    tokio::fs::create_dir_all(output_dir)
        .await
        .map_err(|e| Error::io_with_path(&e, output_dir))?;

    ctx.emit(AppEvent::Artifact(ArtifactEvent::BatchStarted {
        count: build.artifacts.len(),
        output_dir: output_dir.to_path_buf(),
    }));

    for (index, artifact) in build.artifacts.iter().enumerate() {
        let label = artifact
            .name
            .clone()
            .unwrap_or_else(|| format!("artifact #{}", index + 1));

        match download_one(ctx, artifact, output_dir).await {
            Ok(saved) => {
                ctx.emit(AppEvent::Artifact(ArtifactEvent::Saved {
                    name: saved.name.clone(),
                    path: saved.path.clone(),
                    bytes: saved.bytes,
                }));
                report.saved.push(saved);
            }
            Err(e) => {
                ctx.emit(AppEvent::Artifact(ArtifactEvent::Failed {
                    name: label.clone(),
                    code: e.user_code().map(String::from),
                    message: e.user_message().into_owned(),
                }));
                report.failed.push(FailedArtifact {
                    name: label,
                    reason: e.user_message().into_owned(),
                });
            }
        }
    }

    ctx.emit(AppEvent::Artifact(ArtifactEvent::BatchCompleted {
        saved: report.saved.len(),
        failed: report.failed.len(),
    }));

    Ok(report)
}

async fn download_one<S: BuildService>(
    ctx: &OpsCtx<S>,
    artifact: &Artifact,
    output_dir: &Path,
) -> Result<SavedArtifact, Error> {
    let (name, url) = match (artifact.name.as_deref(), artifact.url.as_deref()) {
        (Some(name), Some(url)) if !name.is_empty() && !url.is_empty() => (name, url),
        (None | Some(""), _) => {
            return Err(ArtifactError::Incomplete {
                reason: "missing name".to_string(),
            }
            .into())
        }
        _ => {
            return Err(ArtifactError::Incomplete {
                reason: "missing url".to_string(),
            }
            .into())
        }
    };

    let dest = output_dir.join(checked_file_name(name)?);

    ctx.emit(AppEvent::Artifact(ArtifactEvent::Started {
        name: name.to_string(),
        url: url.to_string(),
    }));

    let bytes = ctx
        .service
        .download_artifact(url, &dest)
        .await
        .map_err(|e| ArtifactError::DownloadFailed {
            name: name.to_string(),
            reason: e.user_message().into_owned(),
        })?;

    Ok(SavedArtifact {
        name: name.to_string(),
        path: dest,
        bytes,
    })
}

/// Names must be a single plain path component
fn checked_file_name(name: &str) -> Result<&Path, ArtifactError> {
    let path = Path::new(name);
    match path.file_name() {
        Some(file_name) if file_name == path.as_os_str() && name != "." && name != ".." => {
            Ok(path)
        }
        _ => Err(ArtifactError::InvalidName {
            name: name.to_string(),
        }),
    }
}
