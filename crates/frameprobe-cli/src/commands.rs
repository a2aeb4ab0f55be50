//! Subcommand handlers

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use frameprobe::core::analysis::{
    AnalysisRequest, AnalysisResult, JobStatus, MediaKind, MediaPayload, SeverityFilter,
};
use frameprobe::core::export::write_pdf_export;
use frameprobe::core::polling::PollProgress;
use frameprobe::core::service::{AnalysisService, HttpAnalysisService};
use frameprobe::core::settings::{default_config_dir, ClientSettings, SettingsManager};
use frameprobe::display::{display_job_id, format_progress, render_report};
use frameprobe::AnalysisSession;

use crate::error::CliError;
use crate::{AnalyzeTarget, Cli, Commands, ConfigAction, ReportArgs};

/// Resolved settings plus where they were loaded from
struct CliContext {
    manager: SettingsManager,
    settings: ClientSettings,
}

impl CliContext {
    fn load(cli: &Cli) -> Result<Self> {
        let config_dir = cli
            .config_dir
            .clone()
            .or_else(default_config_dir)
            .ok_or(CliError::NoConfigDir)?;
        let manager = SettingsManager::new(config_dir);
        let settings = manager
            .load()
            .with_env_overrides()?
            .with_api_url_override(cli.api_url.as_deref())?;
        debug!("Using analysis service at {}", settings.api.base_url);
        Ok(Self { manager, settings })
    }

    fn service(&self) -> Result<Arc<HttpAnalysisService>> {
        let service = HttpAnalysisService::new(&self.settings.api.base_url)?
            .with_timeouts(self.settings.service_timeouts());
        Ok(Arc::new(service))
    }

    fn session(&self) -> Result<AnalysisSession> {
        Ok(AnalysisSession::new(
            self.service()?,
            self.settings.poll_config(),
        ))
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    let ctx = CliContext::load(&cli)?;

    match cli.command {
        Commands::Health => health(&ctx).await,
        Commands::Analyze { target } => analyze(&ctx, target).await,
        Commands::Status { job_id } => status(&ctx, &job_id).await,
        Commands::Result {
            job_id,
            kind,
            output,
        } => result(&ctx, &job_id, kind.into(), &output).await,
        Commands::ExportPdf { job_id, out } => export_pdf(&ctx, &job_id, out).await,
        Commands::Config { action } => config(&ctx, action),
    }
}

async fn health(ctx: &CliContext) -> Result<()> {
    let status = ctx.session()?.check_health().await;
    println!("{} ({})", status, ctx.settings.api.base_url);
    if status.is_online() {
        Ok(())
    } else {
        Err(CliError::ServiceUnavailable(status.to_string()).into())
    }
}

async fn analyze(ctx: &CliContext, target: AnalyzeTarget) -> Result<()> {
    let (request, output, pdf_out) = match target {
        AnalyzeTarget::Video {
            file,
            mode,
            sampling,
            output,
            pdf_out,
        } => {
            let payload = MediaPayload::from_path(&file, MediaKind::Video).await?;
            (AnalysisRequest::video(payload, mode, sampling), output, pdf_out)
        }
        AnalyzeTarget::Images {
            files,
            mode,
            sequence,
            output,
            pdf_out,
        } => {
            let mut payloads = Vec::with_capacity(files.len());
            for file in &files {
                payloads.push(MediaPayload::from_path(file, MediaKind::ImageSequence).await?);
            }
            (AnalysisRequest::images(payloads, mode, sequence), output, pdf_out)
        }
    };

    let mut session = ctx.session()?;
    let job = session.submit(&request).await?;
    println!("Job submitted: {}", display_job_id(&job.job_id));

    let cancel = cancel_on_ctrl_c();
    let (tx, rx) = mpsc::unbounded_channel();
    let printer = spawn_progress_printer(rx);

    let outcome = session.await_result(&cancel, Some(tx)).await.map(Clone::clone);
    // The poller dropped its sender, so the printer drains and exits.
    let _ = printer.await;
    let result = outcome?;

    print_report(&result, &output.filter);

    if let Some(dir) = output.json_out.as_deref() {
        ensure_dir(dir)?;
        let path = session.export_json(dir)?;
        println!("JSON written to {}", path.display());
    }
    if let Some(dir) = pdf_out.as_deref() {
        ensure_dir(dir)?;
        let path = session.export_pdf(dir).await?;
        println!("PDF report written to {}", path.display());
    }
    Ok(())
}

async fn status(ctx: &CliContext, job_id: &str) -> Result<()> {
    let status = ctx.service()?.job_status(job_id).await?;
    match &status {
        JobStatus::Failed { error } => {
            println!("Job {}: failed ({})", display_job_id(job_id), error)
        }
        other => println!("Job {}: {}", display_job_id(job_id), other.as_str()),
    }
    Ok(())
}

async fn result(
    ctx: &CliContext,
    job_id: &str,
    kind: MediaKind,
    output: &ReportArgs,
) -> Result<()> {
    let mut session = ctx.session()?;
    let result = session.load_result(job_id, kind).await?.clone();
    print_report(&result, &output.filter);

    if let Some(dir) = output.json_out.as_deref() {
        ensure_dir(dir)?;
        let path = session.export_json(dir)?;
        println!("JSON written to {}", path.display());
    }
    Ok(())
}

async fn export_pdf(ctx: &CliContext, job_id: &str, out: Option<PathBuf>) -> Result<()> {
    let dir = out.unwrap_or_else(|| ctx.settings.output_dir());
    ensure_dir(&dir)?;

    let pdf = ctx.service()?.fetch_pdf(job_id).await?;
    let path = write_pdf_export(&dir, job_id, &pdf)?;
    println!("PDF report written to {}", path.display());
    Ok(())
}

fn config(ctx: &CliContext, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            println!("{}", serde_json::to_string_pretty(&ctx.settings)?);
            println!("# {}", ctx.manager.settings_path().display());
        }
        ConfigAction::SetUrl { url } => {
            let updated = ctx.manager.load().with_api_url_override(Some(&url))?;
            let saved = ctx
                .manager
                .save(&updated)
                .with_context(|| format!("saving {}", ctx.manager.settings_path().display()))?;
            info!("Analysis service URL set to {}", saved.api.base_url);
            println!("API URL set to {}", saved.api.base_url);
        }
    }
    Ok(())
}

fn print_report(result: &AnalysisResult, filter: &SeverityFilter) {
    println!();
    println!("{}", render_report(result, filter));
}

fn ensure_dir(dir: &Path) -> Result<()> {
    if dir.exists() && !dir.is_dir() {
        return Err(CliError::NotADirectory(dir.to_path_buf()).into());
    }
    Ok(())
}

/// Token cancelled on the first Ctrl-C
fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, cancelling");
            token.cancel();
        }
    });
    cancel
}

fn spawn_progress_printer(mut rx: mpsc::UnboundedReceiver<PollProgress>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(progress) = rx.recv().await {
            eprintln!("{}", format_progress(&progress));
        }
    })
}
