use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cache::ResultCache;
use crate::cli::commands::ScanArgs;
use crate::cli::render;
use crate::config::{EngineSettings, HistorySettings, ScanMode, ScanSettings};
use crate::engine::{EngineApi, ZapEngine};
use crate::errors::ScanError;
use crate::history::HistoryStore;
use crate::models::finding::{Finding, SeverityCounts};
use crate::pipeline::events::ProgressEvent;
use crate::pipeline::ScanOrchestrator;
use crate::progress::ScanProgress;

#[derive(Serialize)]
struct ScanReport<'a> {
    url: &'a str,
    mode: ScanMode,
    counts: SeverityCounts,
    findings: &'a [Finding],
}

pub async fn handle_scan(args: ScanArgs, config_path: Option<&str>) -> Result<(), ScanError> {
    let config = super::load_config(config_path).await?;
    let engine_settings = EngineSettings::resolve(config.engine.as_ref(), args.relay.as_deref())?;
    let scan_settings = ScanSettings::from_config(config.scan.as_ref());
    let history_settings = HistorySettings::from_config(config.history.as_ref());

    let mode = if args.full { ScanMode::Full } else { ScanMode::Quick };
    info!(url = %args.url, mode = %mode, relay = %engine_settings.relay_url, "Starting scan");

    let engine: Arc<dyn EngineApi> = Arc::new(ZapEngine::new(&engine_settings)?);
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<ProgressEvent>();
    let mut orchestrator = ScanOrchestrator::new(engine, Arc::new(ResultCache::new()), scan_settings)
        .with_event_channel(event_tx);

    if !args.no_history {
        match HistoryStore::open(&history_settings.path, history_settings.max_entries) {
            Ok(store) => orchestrator = orchestrator.with_history(Arc::new(store)),
            Err(e) => warn!(error = %e, path = %history_settings.path.display(), "History store unavailable, scan will not be recorded"),
        }
    }

    // First Ctrl-C cancels the scan cooperatively.
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    let signal_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_token.cancel();
        }
    });

    let hidden = args.json;
    let render_task = tokio::spawn(async move {
        let mut progress = ScanProgress::new(hidden);
        while let Some(event) = event_rx.recv().await {
            progress.handle_event(&event);
        }
    });

    let result = orchestrator.run(&args.url, mode, &cancel).await;
    signal_task.abort();
    // Dropping the orchestrator closes the event channel and ends the renderer.
    drop(orchestrator);
    let _ = render_task.await;

    let findings = result?;
    if args.json {
        let report = ScanReport {
            url: &args.url,
            mode,
            counts: SeverityCounts::tally(&findings),
            findings: &findings,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render::render_findings(&args.url, &findings));
    }
    Ok(())
}
