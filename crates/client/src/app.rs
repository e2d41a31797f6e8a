//! Wiring and running one submission.

use anyhow::{Context, Result, anyhow};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{info, warn};

use chain_core::TransactionId;
use chain_hyle::HyleClient;
use prover_client::{HttpProverService, HttpSessionManager, UploadRequest};
use residency_runtime::{Event, SubmissionEvent, SubmissionOrchestrator, Topic};

use crate::cli::Args;
use crate::config::ClientConfig;
use crate::document;

/// Build the orchestrator over the HTTP implementations.
pub fn build_orchestrator(config: &ClientConfig) -> Result<SubmissionOrchestrator> {
    let chain = HyleClient::new(config.hyle.clone()).context("Failed to create Hyle client")?;
    let sessions = HttpSessionManager::new(config.prover.clone())
        .context("Failed to create session manager client")?;
    let prover =
        HttpProverService::new(&config.prover).context("Failed to create prover client")?;

    SubmissionOrchestrator::builder()
        .config(config.runtime.clone())
        .chain(chain)
        .sessions(sessions)
        .prover(prover)
        .build()
        .context("Failed to build orchestrator")
}

/// Submit the document named in `args`, tearing the session down on every
/// exit path including Ctrl-C.
pub async fn run(args: Args, config: ClientConfig) -> Result<()> {
    let upload = document::load(&args.document, &args.claim, args.content_type.as_deref())?;
    let orchestrator = build_orchestrator(&config)?;

    let progress = tokio::spawn(report_progress(
        orchestrator.subscribe(Topic::Submission),
        |line| println!("{}", line),
    ));

    let mut task = tokio::spawn({
        let orchestrator = orchestrator.clone();
        async move { submit(&orchestrator, upload).await }
    });

    let outcome = tokio::select! {
        joined = &mut task => joined.context("Submission task failed")?,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, tearing down the prover session");
            orchestrator.teardown().await;
            if let Err(err) = task.await {
                warn!("Submission task ended abnormally: {}", err);
            }
            Err(anyhow!("Interrupted"))
        }
    };

    orchestrator.teardown().await;

    // Last handle closes the bus; the reporter drains what is left and stops.
    drop(orchestrator);
    if let Err(err) = progress.await {
        warn!("Progress reporter ended abnormally: {}", err);
    }

    let tx_hash = outcome?;
    println!("✓ Residency proven, settled transaction: {}", tx_hash);
    Ok(())
}

async fn submit(
    orchestrator: &SubmissionOrchestrator,
    upload: UploadRequest,
) -> Result<TransactionId> {
    orchestrator
        .start()
        .await
        .context("Prover initialization failed")?;

    info!("Prover ready, submitting {}", upload.file_name);
    let tx_hash = orchestrator
        .submit(upload)
        .await
        .context("Submission failed")?;
    Ok(tx_hash)
}

/// Render submission progress, one line per status change or failure.
fn progress_line(event: &Event) -> Option<String> {
    match event {
        Event::Submission(SubmissionEvent::StatusChanged {
            to,
            progress,
            message,
            ..
        }) => Some(format!("[{:>3}%] {:<12} {}", progress, to.to_string(), message)),
        Event::Submission(SubmissionEvent::Failed { kind, message }) => {
            Some(format!("✗ {}: {}", kind, message))
        }
        _ => None,
    }
}

/// Feed progress lines to `sink` until every sender is gone.
async fn report_progress(mut events: broadcast::Receiver<Event>, mut sink: impl FnMut(String)) {
    loop {
        match events.recv().await {
            Ok(event) => {
                if let Some(line) = progress_line(&event) {
                    sink(line);
                }
            }
            Err(RecvError::Lagged(skipped)) => warn!("Progress display skipped {} events", skipped),
            Err(RecvError::Closed) => break,
        }
    }
}
