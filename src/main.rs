// ABOUTME: Entry point for the perista CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;

use clap::Parser;
use cli::{Cli, Commands, parse_device_spec};
use perista::backend::MscBackend;
use perista::config::{SETTINGS_FILENAME, Settings, TherapyProfile};
use perista::deploy::{Coordinator, EventSink, OverallProgress, SkipFlag, UpdateResult};
use perista::diagnostics::Diagnostics;
use perista::error::{Error, Result};
use perista::output::{Output, OutputMode};
use perista::types::{Batch, Device, FirmwareBundle, FirmwareVersion};
use std::env;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };
    let output = Output::new(mode);

    let result = run(cli, Output::new(mode)).await;

    if let Err(e) = result {
        // Batch failures already printed their fixed result message.
        if !matches!(e, Error::BatchFailed) {
            output.error(&e.to_string());
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli, mut output: Output) -> Result<()> {
    match cli.command {
        Commands::Init { force } => init_settings(force, &output),
        Commands::Update {
            firmware,
            fw_version,
            devices,
            force,
        } => {
            output.start_timer();
            update(&firmware, &fw_version, &devices, force, &output).await
        }
        Commands::Configure {
            profile,
            devices,
            force,
        } => {
            output.start_timer();
            configure(&profile, &devices, force, &output).await
        }
    }
}

fn init_settings(force: bool, output: &Output) -> Result<()> {
    let path = env::current_dir()?.join(SETTINGS_FILENAME);
    if path.exists() && !force {
        return Err(Error::AlreadyExists(path));
    }
    std::fs::write(&path, Settings::template())?;
    output.success(&format!("Wrote {}", path.display()));
    Ok(())
}

async fn update(
    firmware: &Path,
    fw_version: &str,
    device_specs: &[String],
    force: bool,
    output: &Output,
) -> Result<()> {
    let settings = Settings::load_or_default(&env::current_dir()?)?;
    let backend = MscBackend::new();
    let batch = build_batch(&backend, device_specs).await?;
    let version = FirmwareVersion::new(fw_version)?;
    let bundle = FirmwareBundle::open(version, firmware)?;

    output.progress(&format!(
        "Deploying firmware {} to {} device(s)",
        bundle,
        batch.len()
    ));

    let coordinator = Coordinator::new(backend, settings);
    let (sink, skip) = event_plumbing(output.mode(), &batch);
    let mut diag = Diagnostics::default();

    let result = coordinator
        .perform_batch_update(&batch, &bundle, sink, &skip, force, &mut diag)
        .await;

    report(&result, &diag, output)
}

async fn configure(
    profile_path: &Path,
    device_specs: &[String],
    force: bool,
    output: &Output,
) -> Result<()> {
    let settings = Settings::load_or_default(&env::current_dir()?)?;
    let backend = MscBackend::new();
    let batch = build_batch(&backend, device_specs).await?;
    let profile = TherapyProfile::load(profile_path)?;

    output.progress(&format!(
        "Applying therapy profile '{}' to {} device(s)",
        profile.name,
        batch.len()
    ));

    let coordinator = Coordinator::new(backend, settings);
    let (sink, skip) = event_plumbing(output.mode(), &batch);
    let mut diag = Diagnostics::default();

    let result = coordinator
        .perform_batch_configure(&batch, &profile, sink, &skip, force, &mut diag)
        .await;

    report(&result, &diag, output)
}

/// Probe each device spec into a validated batch.
async fn build_batch(backend: &MscBackend, specs: &[String]) -> Result<Batch> {
    let mut devices: Vec<Device> = Vec::with_capacity(specs.len());
    for spec in specs {
        let (path, role) = parse_device_spec(spec)?;
        let mut device = backend.probe(&path).await?;
        device.role = role;
        devices.push(device);
    }
    Ok(Batch::new(devices)?)
}

/// Build the event sink and the operator skip flag.
///
/// The sink folds events into the weighted overall-progress aggregate as
/// they arrive. Ctrl-C does not interrupt a running device sequence; it
/// only skips the devices that have not started yet.
fn event_plumbing(mode: OutputMode, batch: &Batch) -> (EventSink, SkipFlag) {
    let mut overall = OverallProgress::new(batch.iter().map(|d| &d.path));
    // The bundle is already local, so the download phase is complete.
    overall.set_download(100);
    overall.begin_install();

    let event_output = Arc::new(Output::new(mode));
    let overall = Arc::new(parking_lot::Mutex::new(overall));
    let sink: EventSink = Arc::new(move |event| {
        let percent = {
            let mut overall = overall.lock();
            overall.observe(&event);
            overall.overall()
        };
        event_output.stage_event(&event, percent);
    });

    let skip: SkipFlag = Arc::new(AtomicBool::new(false));
    let skip_on_signal = Arc::clone(&skip);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received; remaining devices will be skipped");
            skip_on_signal.store(true, Ordering::SeqCst);
        }
    });
    (sink, skip)
}

fn report(result: &UpdateResult, diag: &Diagnostics, output: &Output) -> Result<()> {
    for update in &result.device_updates {
        match &update.error {
            None => output.progress(&format!("  ✓ {}", update.device)),
            Some(error) => output.error(&format!("{}: {error}", update.device)),
        }
    }

    for warning in diag.warnings() {
        output.warning(&warning.message);
    }

    if result.success {
        output.success(&result.message);
        Ok(())
    } else {
        output.error(&result.message);
        Err(Error::BatchFailed)
    }
}
