//! Event handling and progress display

use crate::display::format_size;
use crate::logging::log_event_with_tracing;
use cmbuild_events::{AppEvent, ApplicationEvent, ArtifactEvent, BuildEvent, GeneralEvent};
use console::Style;

/// Where a rendered line goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Stdout,
    Stderr,
}

/// Event handler for progress display and user feedback
pub struct EventHandler {
    /// Suppress terminal output entirely (JSON mode)
    quiet: bool,
    colors: bool,
    /// Show debug-level events
    debug: bool,
}

impl EventHandler {
    /// Create new event handler
    pub fn new(quiet: bool, colors: bool, debug: bool) -> Self {
        Self {
            quiet,
            colors,
            debug,
        }
    }

    /// Handle incoming event
    pub fn handle_event(&mut self, event: &AppEvent) {
        log_event_with_tracing(event);

        if self.quiet {
            return;
        }

        for (stream, line) in self.render(event) {
            match stream {
                Stream::Stdout => println!("{line}"),
                Stream::Stderr => eprintln!("{line}"),
            }
        }
    }

    fn render(&self, event: &AppEvent) -> Vec<(Stream, String)> {
        let out = |line: String| vec![(Stream::Stdout, line)];

        match event {
            AppEvent::Application(app_event) => match app_event {
                ApplicationEvent::ListRequested => out("Fetching applications...".to_string()),
                ApplicationEvent::Resolved {
                    app_id, app_name, ..
                } => out(format!(
                    "Found app: {} ({app_id})",
                    self.bold(app_name)
                )),
                ApplicationEvent::WorkflowsListed { workflows, .. } => {
                    let mut lines = vec![(Stream::Stdout, "Available workflows:".to_string())];
                    if workflows.is_empty() {
                        lines.push((Stream::Stdout, "  (none defined)".to_string()));
                    }
                    for workflow in workflows {
                        lines.push((
                            Stream::Stdout,
                            format!("  - {}: {}", workflow.id, workflow.name),
                        ));
                    }
                    lines
                }
                ApplicationEvent::ListFetched { .. } => Vec::new(),
            },

            AppEvent::Build(build_event) => match build_event {
                BuildEvent::Submitting {
                    workflow_id,
                    branch,
                    ..
                } => out(format!(
                    "Starting build with workflow '{workflow_id}' on branch '{branch}'"
                )),
                BuildEvent::Submitted {
                    build_id,
                    dashboard_url,
                } => {
                    let mut lines = out(format!(
                        "{} Build started: {build_id}",
                        self.styled(Style::new().green(), "OK")
                    ));
                    if let Some(url) = dashboard_url {
                        lines.push((Stream::Stdout, format!("View build: {url}")));
                    }
                    lines
                }
                BuildEvent::MonitorStarted {
                    build_id,
                    poll_interval_secs,
                    max_polls,
                } => {
                    let limit = max_polls
                        .map(|max| format!(", at most {max} polls"))
                        .unwrap_or_default();
                    vec![
                        (
                            Stream::Stdout,
                            format!(
                                "Monitoring build {build_id} (every {poll_interval_secs}s{limit})"
                            ),
                        ),
                        (
                            Stream::Stdout,
                            "This can take 15-25 minutes for iOS builds.".to_string(),
                        ),
                    ]
                }
                BuildEvent::StatusChanged {
                    status,
                    elapsed_secs,
                    ..
                } => out(format!("[{elapsed_secs}s] Status: {}", self.bold(status))),
                BuildEvent::PollFailed {
                    reason,
                    consecutive_failures,
                    next_delay_ms,
                    ..
                } if self.debug => vec![(
                    Stream::Stderr,
                    format!(
                        "Status poll failed ({consecutive_failures} in a row, next in {}s): {reason}",
                        next_delay_ms / 1000
                    ),
                )],
                BuildEvent::Completed {
                    status,
                    elapsed_secs,
                    ..
                } => {
                    let style = if status == "finished" {
                        Style::new().green()
                    } else {
                        Style::new().red()
                    };
                    out(format!(
                        "Build {} after {elapsed_secs}s",
                        self.styled(style, status)
                    ))
                }
                BuildEvent::PollFailed { .. } => Vec::new(),
            },

            AppEvent::Artifact(artifact_event) => match artifact_event {
                ArtifactEvent::NoneAvailable { build_id } => vec![(
                    Stream::Stderr,
                    format!("Warning: no artifacts found for build {build_id}"),
                )],
                ArtifactEvent::BatchStarted { count, output_dir } => out(format!(
                    "Downloading {count} artifact(s) to {}",
                    output_dir.display()
                )),
                ArtifactEvent::Started { name, url } if self.debug => {
                    out(format!("  fetching {name} from {url}"))
                }
                ArtifactEvent::Saved { name, bytes, .. } => out(format!(
                    "  {} {name} ({})",
                    self.styled(Style::new().green(), "saved"),
                    format_size(*bytes)
                )),
                ArtifactEvent::Failed { name, message, .. } => vec![(
                    Stream::Stderr,
                    format!(
                        "  {} {name}: {message}",
                        self.styled(Style::new().yellow(), "failed")
                    ),
                )],
                ArtifactEvent::Started { .. } | ArtifactEvent::BatchCompleted { .. } => {
                    Vec::new()
                }
            },

            AppEvent::General(general_event) => match general_event {
                GeneralEvent::Warning { message, context } => {
                    let mut lines = vec![(
                        Stream::Stderr,
                        format!("{} {message}", self.styled(Style::new().yellow(), "Warning:")),
                    )];
                    if let Some(context) = context {
                        lines.push((Stream::Stderr, format!("  {context}")));
                    }
                    lines
                }
                GeneralEvent::DebugLog { message, .. } if self.debug => {
                    vec![(Stream::Stderr, format!("[debug] {message}"))]
                }
                _ => Vec::new(),
            },
        }
    }

    fn bold(&self, text: &str) -> String {
        self.styled(Style::new().bold(), text)
    }

    fn styled(&self, style: Style, text: &str) -> String {
        if self.colors {
            style.apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }
}
