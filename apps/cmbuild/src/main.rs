//! cmbuild - trigger a remote iOS build and collect its artifacts
//!
//! The binary wires configuration, the HTTP-backed build service and the
//! event channel together, then runs the whole flow through the ops crate.

mod cli;
mod display;
mod error;
mod events;
mod logging;

use crate::cli::{Cli, GlobalArgs, TOKEN_HELP};
use crate::display::OutputRenderer;
use crate::error::CliError;
use crate::events::EventHandler;
use clap::error::ErrorKind;
use clap::Parser;
use cmbuild_config::Config;
use cmbuild_events::EventReceiver;
use cmbuild_ops::{OpsContextBuilder, OpsCtx, RemoteService, RunReport, RunRequest};
use std::process;
use tokio::select;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Parse command line arguments first to check for JSON mode
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.kind() == ErrorKind::MissingRequiredArgument => {
            eprintln!("{e}");
            eprintln!("{TOKEN_HELP}");
            process::exit(2);
        }
        Err(e) => e.exit(),
    };
    let json_mode = cli.global.json;

    init_tracing(json_mode, cli.global.debug);

    match run(cli).await {
        Ok(report) if report.succeeded() => {
            info!(build_id = %report.build_id, "Build finished");
        }
        Ok(report) => {
            info!(
                build_id = %report.build_id,
                status = report.build.status_str(),
                "Build did not finish"
            );
            process::exit(1);
        }
        Err(e) => {
            error!("Application error: {}", e);
            if json_mode {
                if let Err(io_err) = OutputRenderer::render_error_json(e.code(), &e.to_string()) {
                    eprintln!("Error: {io_err}");
                }
            } else {
                eprintln!("Error: {e}");
            }
            process::exit(1);
        }
    }
}

/// Main application logic
async fn run(cli: Cli) -> Result<RunReport, CliError> {
    info!("Starting cmbuild v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration with proper precedence:
    // 1. Start with file config (or defaults)
    let mut config = Config::load_or_default(cli.global.config.as_deref()).await?;

    // 2. Merge environment variables
    config.merge_env()?;

    // 3. Apply CLI flags (highest precedence)
    apply_cli_config(&mut config, &cli)?;
    config.validate()?;

    if cli.token.trim().is_empty() {
        return Err(CliError::InvalidArguments(
            "the API token must not be empty".to_string(),
        ));
    }

    // Create event channel
    let (event_sender, event_receiver) = cmbuild_events::channel();

    let service = RemoteService::from_config(&config, cli.token.trim())?;
    let request = RunRequest::from_config(&config);

    let ctx = OpsContextBuilder::new()
        .with_service(service)
        .with_event_sender(event_sender)
        .with_config(config)
        .build()?;

    let colors = !cli.global.json && cli.global.color.enabled();
    let renderer = OutputRenderer::new(cli.global.json, colors);
    let mut event_handler = EventHandler::new(cli.global.json, colors, cli.global.debug);

    let report = execute_with_events(&ctx, &request, event_receiver, &mut event_handler).await?;

    renderer.render_report(&report)?;

    info!("Command completed");
    Ok(report)
}

/// Run the full flow with concurrent event handling
async fn execute_with_events(
    ctx: &OpsCtx<RemoteService>,
    request: &RunRequest,
    mut event_receiver: EventReceiver,
    event_handler: &mut EventHandler,
) -> Result<RunReport, CliError> {
    let mut run_future = Box::pin(cmbuild_ops::run_full_process(ctx, request));

    loop {
        select! {
            result = &mut run_future => {
                // Drain any remaining events
                while let Ok(event) = event_receiver.try_recv() {
                    event_handler.handle_event(&event);
                }
                return result.map_err(CliError::from);
            }

            event = event_receiver.recv() => {
                match event {
                    Some(event) => event_handler.handle_event(&event),
                    None => { /* Channel closed: keep waiting for the run to finish */ }
                }
            }
        }
    }
}

/// Initialize tracing/logging
fn init_tracing(json_mode: bool, debug_enabled_flag: bool) {
    let debug_enabled = std::env::var("RUST_LOG").is_ok() || debug_enabled_flag;

    if debug_enabled {
        // Debug mode: structured JSON logs to file
        let log_dir = Config::logs_dir();
        let log_file = log_dir.join(format!(
            "cmbuild-{}.log",
            chrono::Utc::now().format("%Y%m%d-%H%M%S")
        ));

        let file = std::fs::create_dir_all(&log_dir).and_then(|()| std::fs::File::create(&log_file));
        match file {
            Ok(file) => {
                tracing_subscriber::fmt()
                    .json()
                    .with_writer(file)
                    .with_env_filter(
                        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(
                            |_| tracing_subscriber::EnvFilter::new("info,cmbuild=debug"),
                        ),
                    )
                    .init();

                if !json_mode {
                    eprintln!("Debug logging enabled: {}", log_file.display());
                }
                return;
            }
            Err(e) => {
                if !json_mode {
                    eprintln!("Warning: Failed to create log file: {e}");
                }
            }
        }
    }

    if json_mode {
        // Keep stdout clean for the JSON report
        tracing_subscriber::fmt()
            .with_writer(std::io::sink)
            .with_env_filter("off")
            .init();
    } else {
        // Normal mode: minimal logging to stderr
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .init();
    }
}

/// Apply CLI configuration overrides (highest precedence)
fn apply_cli_config(config: &mut Config, cli: &Cli) -> Result<(), CliError> {
    let GlobalArgs {
        app,
        output_dir,
        poll_interval,
        max_polls,
        ..
    } = &cli.global;

    if let Some(workflow) = &cli.workflow {
        config.build.workflow.clone_from(workflow);
    }
    if let Some(branch) = &cli.branch {
        config.build.branch.clone_from(branch);
    }
    if let Some(app) = app {
        config.api.app_name.clone_from(app);
    }
    if let Some(dir) = output_dir {
        config.paths.output_dir = Some(dir.clone());
    }
    if let Some(secs) = poll_interval {
        config.monitor.poll_interval = *secs;
    }
    if let Some(max) = max_polls {
        config.monitor.max_polls = Some(*max);
    }

    for (name, value) in [
        ("workflow", &config.build.workflow),
        ("branch", &config.build.branch),
        ("app", &config.api.app_name),
    ] {
        if value.trim().is_empty() {
            return Err(CliError::InvalidArguments(format!("{name} must not be empty")));
        }
    }

    Ok(())
}
