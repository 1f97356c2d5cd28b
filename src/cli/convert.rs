//! CLI command: `sheetbridge convert`
//!
//! Converts each input sequentially, reports progress from the event bus,
//! then prints a per-job summary and the quota status table.

use anyhow::{bail, Result};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use sheetbridge_core::{
    ConversionReport, ConversionRequest, EventBus, GovernanceEvent, JobState, QuotaStatus,
};

use super::ConvertArgs;
use crate::app::{build_orchestrator, AppConfig};

/// Run the convert subcommand.
pub async fn run(mut config: AppConfig, args: ConvertArgs) -> Result<()> {
    config.conversion.keep_intermediates |= args.keep_intermediates;
    config.conversion.remove_source |= args.remove_source;
    config.conversion.reuse_existing |= args.reuse_existing;

    let requests = args
        .inputs
        .iter()
        .map(|input| parse_file_id(input).map(ConversionRequest::new))
        .collect::<Result<Vec<_>>>()?;

    let events = EventBus::default();
    let cancel = CancellationToken::new();
    let orchestrator = build_orchestrator(&config, events.clone(), cancel.clone())?;

    let progress = tokio::spawn(report_progress(events.subscribe(), !args.json));
    let interrupt = cancel_on_interrupt(cancel.clone());

    let reports = orchestrator.convert_all(requests).await;
    let quota = orchestrator.caller().status();
    interrupt.abort();

    // Dropping every sender lets the progress task drain and stop
    drop(orchestrator);
    drop(events);
    let _ = progress.await;

    if args.json {
        let output = serde_json::json!({
            "jobs": reports,
            "quota": quota,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_jobs(&reports);
        print_quota(&quota);
    }

    let failed = reports.iter().filter(|r| !r.is_success()).count();
    let skipped = args.inputs.len() - reports.len();
    if failed > 0 || skipped > 0 {
        bail!(
            "{} of {} conversion(s) did not succeed",
            failed + skipped,
            args.inputs.len()
        );
    }
    Ok(())
}

/// Cancel `token` on Ctrl-C. Abort the handle once the work is done.
pub(super) fn cancel_on_interrupt(token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling pending waits");
            token.cancel();
        }
    })
}

/// Extract a file id from a bare id or a Drive / Sheets URL
pub fn parse_file_id(input: &str) -> Result<String> {
    let input = input.trim();
    let candidate = if let Some(pos) = input.find("/d/") {
        &input[pos + 3..]
    } else if let Some(pos) = input.find("id=") {
        &input[pos + 3..]
    } else {
        input
    };

    let id: String = candidate
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();

    if id.is_empty() || (candidate.len() == input.len() && id.len() != input.len()) {
        bail!("Not a file id or Drive URL: {input}");
    }
    Ok(id)
}

async fn report_progress(mut rx: broadcast::Receiver<GovernanceEvent>, print: bool) {
    loop {
        match rx.recv().await {
            Ok(event) if print => print_event(&event),
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Progress display fell behind");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

fn print_event(event: &GovernanceEvent) {
    match event {
        GovernanceEvent::CallsProgress {
            category,
            calls,
            tallies,
        } => eprintln!(
            "  .. {category}: {calls} calls ({} ok, {} quota, {} transient, {} fatal)",
            tallies.success, tallies.quota_rejected, tallies.transient, tallies.fatal
        ),
        GovernanceEvent::QuotaWarning {
            category,
            usage,
            ceiling,
        } => eprintln!("  !! {category} near its limit: {usage}/{ceiling}"),
        GovernanceEvent::TierTransition { reason, .. } => {
            eprintln!("  -> switching to enhanced conversion: {reason}")
        }
        GovernanceEvent::CleanupFailed {
            artifact_id,
            message,
            ..
        } => eprintln!("  !! could not delete {artifact_id}: {message}"),
        GovernanceEvent::Retrying { .. } | GovernanceEvent::JobFinished { .. } => {}
    }
}

fn state_label(state: JobState) -> &'static str {
    match state {
        JobState::Running => "running",
        JobState::Succeeded => "succeeded",
        JobState::FailedBothTiers => "failed (both tiers)",
        JobState::Failed => "failed",
    }
}

fn print_jobs(reports: &[ConversionReport]) {
    println!();
    println!("  Conversions");
    println!("  {}", "-".repeat(72));
    println!("  {:<34} {:<20} Result", "Source", "State");
    println!("  {}", "-".repeat(72));

    if reports.is_empty() {
        println!("  (nothing converted)");
    }
    for report in reports {
        let result = match (&report.final_artifact, &report.failure) {
            (Some(id), _) if report.converted => id.clone(),
            (Some(id), _) => format!("{id} (existing)"),
            (None, Some(failure)) => failure.clone(),
            (None, None) => "-".to_string(),
        };
        println!(
            "  {:<34} {:<20} {}",
            report.source_file_id,
            state_label(report.state),
            result
        );
        if let Some(suggestion) = &report.suggestion {
            println!("  {:<34} {:<20} {}", "", "", suggestion);
        }
        for failure in &report.cleanup_failures {
            println!(
                "  {:<34} {:<20} left behind {}: {}",
                "", "", failure.artifact_id, failure.message
            );
        }
    }
}

pub(super) fn print_quota(status: &QuotaStatus) {
    println!("  {}", "-".repeat(72));
    println!(
        "  {:<30} {:<22} {:<10} Calls (ok/quota/transient/fatal)",
        "Quota", "Usage", "Resets In"
    );
    println!("  {}", "-".repeat(72));
    for category in &status.categories {
        let usage = format!(
            "{}/{} ({:.1}%)",
            category.usage,
            category.ceiling,
            category.usage_ratio() * 100.0
        );
        let resets = category
            .resets_in_secs
            .map(|s| format!("{s}s"))
            .unwrap_or_else(|| "-".to_string());
        let tallies = &category.tallies;
        let outcomes = if tallies.total() == 0 {
            "-".to_string()
        } else {
            format!(
                "{} ({}/{}/{}/{})",
                tallies.total(),
                tallies.success,
                tallies.quota_rejected,
                tallies.transient,
                tallies.fatal
            )
        };
        println!(
            "  {:<30} {:<22} {:<10} {}",
            category.category.as_str(),
            usage,
            resets,
            outcomes
        );
    }
    let near_limit = status.near_limit();
    if !near_limit.is_empty() {
        let names: Vec<&str> = near_limit.iter().map(|c| c.as_str()).collect();
        println!("  !! Near the limit: {}", names.join(", "));
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_id() {
        assert_eq!(
            parse_file_id(" 1AbC_d-EfG ").unwrap(),
            "1AbC_d-EfG".to_string()
        );
    }

    #[test]
    fn test_parse_urls() {
        assert_eq!(
            parse_file_id("https://docs.google.com/spreadsheets/d/1XyZ-9_q/edit#gid=0").unwrap(),
            "1XyZ-9_q"
        );
        assert_eq!(
            parse_file_id("https://drive.google.com/file/d/abc123/view?usp=sharing").unwrap(),
            "abc123"
        );
        assert_eq!(
            parse_file_id("https://drive.google.com/open?id=abc123").unwrap(),
            "abc123"
        );
    }

    #[test]
    fn test_reject_garbage() {
        assert!(parse_file_id("").is_err());
        assert!(parse_file_id("not an id").is_err());
        assert!(parse_file_id("https://docs.google.com/spreadsheets/d/").is_err());
    }
}
