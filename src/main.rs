//! Line-oriented front end for the AOSP Forge core.
//!
//! Walks the operator through the wizard steps over stdin/stdout, then
//! follows the monitor's event stream until the build reaches a terminal
//! outcome. All state, gating, and polling live in the library; this
//! binary only reads lines and prints.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tokio::sync::mpsc;

use aosp_forge::api::HttpBackend;
use aosp_forge::app::{AppController, AppEvent};
use aosp_forge::config::SettingsManager;
use aosp_forge::log_collector::{self, get_global_logs_path};
use aosp_forge::models::{
    AcquisitionMode, AndroidVersion, BuildVariant, ManualSubMode, SearchProvider, SourceKind,
};
use aosp_forge::monitor::MonitorEvent;
use aosp_forge::wizard::{WizardAction, WizardStep};

#[tokio::main]
async fn main() -> Result<()> {
    // Logging first: everything below reports through the collector.
    let log_dir = get_global_logs_path().map_err(|e| anyhow!(e))?;
    let collector = log_collector::init_global(log_dir).map_err(|e| anyhow!(e))?;
    log::info!("AOSP Forge {} starting", aosp_forge::VERSION);

    let settings = SettingsManager::load().context("failed to load settings")?;
    let backend = Arc::new(
        HttpBackend::new(&settings.backend_url, settings.request_timeout())
            .context("failed to construct backend client")?,
    );

    let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(1024);
    let controller = Arc::new(AppController::new(
        settings,
        backend,
        event_tx,
        Some(collector),
    ));

    println!("AOSP Forge — guided ROM build");
    match controller.ping().await {
        Ok(health) => println!(
            "Connected to {} ({})",
            controller.settings().backend_url,
            health.service
        ),
        Err(e) => println!("Warning: build service not reachable yet: {}", e.user_message()),
    }

    loop {
        let step = controller.snapshot().await.step;
        match step {
            WizardStep::Setup => {
                if !run_setup_step(&controller).await? {
                    break;
                }
            }
            WizardStep::DeviceTree => run_source_step(&controller, SourceKind::DeviceTree).await?,
            WizardStep::Kernel => run_source_step(&controller, SourceKind::Kernel).await?,
            WizardStep::Vendor => run_source_step(&controller, SourceKind::Vendor).await?,
            WizardStep::BuildConfig => run_build_config_step(&controller).await?,
            WizardStep::Dashboard => {
                follow_build(&mut event_rx).await;
                if !offer_new_build(&controller).await? {
                    break;
                }
            }
        }
    }

    controller.shutdown().await;
    log::info!("AOSP Forge exiting");
    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush().context("stdout flush failed")?;
    let mut line = String::new();
    io::stdin().read_line(&mut line).context("stdin read failed")?;
    Ok(line.trim().to_string())
}

/// Setup: gate on the collaborator's readiness report.
async fn run_setup_step(controller: &AppController) -> Result<bool> {
    println!("\n-- Step 1/6: system check --");
    match controller.check_readiness().await {
        Ok(readiness) if readiness.system_ready => {
            println!("System ready ({} packages present).", readiness.installed.len());
        }
        Ok(readiness) => {
            println!("Missing packages: {}", readiness.missing.join(", "));
        }
        Err(e) => println!("Readiness check failed: {}", e.user_message()),
    }

    loop {
        let choice = prompt("[c]ontinue  [i]nstall dependencies  [r]echeck  [q]uit > ")?;
        match choice.as_str() {
            "c" => {
                if controller.dispatch(WizardAction::Continue).await.is_ok() {
                    return Ok(true);
                }
                println!("Continue is unavailable until the system is ready.");
            }
            "i" => match controller.install_dependencies().await {
                Ok(report) => println!("Installer: {}", report.message),
                Err(e) => println!("Install failed: {}", e.user_message()),
            },
            "r" => {
                if let Ok(readiness) = controller.check_readiness().await {
                    if readiness.system_ready {
                        println!("System ready.");
                    } else {
                        println!("Still missing: {}", readiness.missing.join(", "));
                    }
                }
            }
            "q" => return Ok(false),
            _ => {}
        }
    }
}

/// One source step: search or manual entry until the kind is resolved.
async fn run_source_step(controller: &AppController, kind: SourceKind) -> Result<()> {
    println!("\n-- Step {}/6: {} --", kind.index() + 2, kind);
    if let Some(value) = controller.snapshot().await.slot(kind).spec.resolved_value() {
        println!("Currently resolved: {}", value);
    }

    loop {
        let choice = prompt("[s]earch  [m]anual  [b]ack  [c]ontinue > ")?;
        match choice.as_str() {
            "s" => {
                controller
                    .dispatch(WizardAction::SetAcquisitionMode(kind, AcquisitionMode::Search))
                    .await
                    .ok();
                let provider = prompt("provider [github/gitlab] (github) > ")?;
                if let Ok(provider) = provider.parse::<SearchProvider>() {
                    controller
                        .dispatch(WizardAction::SetSearchProvider(kind, provider))
                        .await
                        .ok();
                }
                let query = prompt("query > ")?;
                if query.is_empty() {
                    continue;
                }
                if let Err(e) = controller.search(kind, query).await {
                    println!("{}", e);
                    continue;
                }
                let state = controller.snapshot().await;
                let results = &state.slot(kind).session.results;
                if results.is_empty() {
                    if let Some(notice) = &state.search_notice {
                        println!("Search failed: {}", notice);
                    } else {
                        println!("No results.");
                    }
                    continue;
                }
                for (i, hit) in results.iter().enumerate() {
                    println!(
                        "  [{}] {} ({} stars) — {}",
                        i,
                        hit.full_name,
                        hit.stars,
                        hit.description.as_deref().unwrap_or("no description")
                    );
                }
                let pick = prompt("select # (or blank to skip) > ")?;
                if let Ok(index) = pick.parse::<usize>() {
                    match controller.dispatch(WizardAction::ResultSelected(kind, index)).await {
                        Ok(()) => {
                            let state = controller.snapshot().await;
                            if let Some(value) = state.slot(kind).spec.resolved_value() {
                                println!("Resolved: {}", value);
                            }
                        }
                        Err(e) => println!("{}", e),
                    }
                }
            }
            "m" => {
                controller
                    .dispatch(WizardAction::SetAcquisitionMode(kind, AcquisitionMode::Manual))
                    .await
                    .ok();
                let sub = prompt("[u]rl or [l]ocal path > ")?;
                let sub_mode = if sub == "l" { ManualSubMode::Local } else { ManualSubMode::Url };
                controller
                    .dispatch(WizardAction::SetManualSubMode(kind, sub_mode))
                    .await
                    .ok();
                let value = prompt("value > ")?;
                controller
                    .dispatch(WizardAction::ManualValueEdited(kind, value))
                    .await
                    .ok();
            }
            "b" => {
                controller.back().await.ok();
                return Ok(());
            }
            "c" => match controller.advance().await {
                Ok(()) => return Ok(()),
                Err(_) => println!("Resolve the {} first.", kind),
            },
            _ => {}
        }
    }
}

/// Final configuration step; Continue submits the build request.
async fn run_build_config_step(controller: &AppController) -> Result<()> {
    println!("\n-- Step 5/6: build configuration --");
    let state = controller.snapshot().await;

    let name = prompt(&format!("device name [{}] > ", state.device_name))?;
    if !name.is_empty() {
        controller.dispatch(WizardAction::SetDeviceName(name)).await.ok();
    }
    let codename = prompt(&format!("device codename [{}] > ", state.device_codename))?;
    if !codename.is_empty() {
        controller
            .dispatch(WizardAction::SetDeviceCodename(codename))
            .await
            .ok();
    }
    let version = prompt(&format!("android version 14/15/16 [{}] > ", state.android_version))?;
    if let Ok(version) = version.parse::<AndroidVersion>() {
        controller
            .dispatch(WizardAction::SetAndroidVersion(version))
            .await
            .ok();
    }
    let variant = prompt(&format!(
        "build variant user/userdebug/eng [{}] > ",
        state.build_variant
    ))?;
    if let Ok(variant) = variant.parse::<BuildVariant>() {
        controller.dispatch(WizardAction::SetBuildVariant(variant)).await.ok();
    }
    let directory = prompt(&format!("build directory [{}] > ", state.build_directory))?;
    if !directory.is_empty() {
        controller
            .dispatch(WizardAction::SetBuildDirectory(directory))
            .await
            .ok();
    }

    loop {
        let choice = prompt("[s]tart build  [b]ack > ")?;
        match choice.as_str() {
            "s" => {
                match controller.advance().await {
                    Ok(()) => {}
                    Err(e) => {
                        println!("Cannot submit: {}", e);
                        continue;
                    }
                }
                let state = controller.snapshot().await;
                if state.step == WizardStep::Dashboard {
                    println!("Build accepted.");
                    return Ok(());
                }
                if let Some(notice) = &state.submit_notice {
                    println!("Submission failed: {}", notice);
                    controller.dispatch(WizardAction::DismissSubmitNotice).await.ok();
                }
            }
            "b" => {
                controller.back().await.ok();
                return Ok(());
            }
            _ => {}
        }
    }
}

/// Follow the monitor's event stream until the build is terminal.
async fn follow_build(event_rx: &mut mpsc::Receiver<AppEvent>) {
    println!("\n-- Step 6/6: build dashboard --");
    while let Some(event) = event_rx.recv().await {
        match event {
            AppEvent::Monitor(MonitorEvent::Progress(progress)) => {
                println!("progress: {}%", progress);
            }
            AppEvent::Monitor(MonitorEvent::Stage(stage)) => {
                println!("stage: {}", stage);
            }
            AppEvent::Monitor(MonitorEvent::Logs(logs)) => {
                if let Some(last) = logs.last() {
                    println!("log: {}", last);
                }
            }
            AppEvent::Monitor(MonitorEvent::PollFailed(_)) => {
                // Transient; the next tick corrects it.
            }
            AppEvent::Monitor(MonitorEvent::Finished(outcome)) => {
                println!("build finished: {}", outcome);
                return;
            }
            _ => {}
        }
    }
}

/// Terminal dashboard: offer a full restart.
async fn offer_new_build(controller: &AppController) -> Result<bool> {
    loop {
        let choice = prompt("[n]ew build  [q]uit > ")?;
        match choice.as_str() {
            "n" => match controller.start_new_build().await {
                Ok(()) => return Ok(true),
                Err(e) => println!("{}", e),
            },
            "q" => return Ok(false),
            _ => {}
        }
    }
}
