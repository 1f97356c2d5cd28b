//! CLI command: `sheetbridge cleanup`
//!
//! Deletes converted spreadsheets after the fact. Inputs come from the
//! command line and from an optional list file (one id or URL per line,
//! `#` starts a comment).

use anyhow::{bail, Context, Result};
use std::path::Path;
use tokio_util::sync::CancellationToken;

use sheetbridge_core::EventBus;

use super::convert::{cancel_on_interrupt, parse_file_id, print_quota};
use super::CleanupArgs;
use crate::app::{build_orchestrator, AppConfig};

/// Run the cleanup subcommand.
pub async fn run(config: AppConfig, args: CleanupArgs) -> Result<()> {
    let mut inputs = args.inputs.clone();
    if let Some(path) = &args.urls_file {
        inputs.extend(read_list_file(path)?);
    }
    if inputs.is_empty() {
        bail!("Nothing to delete: pass file ids or --urls-file");
    }
    let file_ids = resolve_ids(&inputs)?;

    let cancel = CancellationToken::new();
    let orchestrator = build_orchestrator(&config, EventBus::default(), cancel.clone())?;
    let interrupt = cancel_on_interrupt(cancel);

    let failures = orchestrator.delete_files(&file_ids).await;
    let quota = orchestrator.caller().status();
    interrupt.abort();

    let deleted = file_ids.len() - failures.len();
    if args.json {
        let output = serde_json::json!({
            "deleted": deleted,
            "failures": failures,
            "quota": quota,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!();
        println!("  Deleted {deleted} of {} file(s)", file_ids.len());
        for failure in &failures {
            println!("  !! {}: {}", failure.artifact_id, failure.message);
        }
        print_quota(&quota);
    }

    if !failures.is_empty() {
        bail!("{} file(s) could not be deleted", failures.len());
    }
    Ok(())
}

fn read_list_file(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(list_entries(&text))
}

/// Non-empty, non-comment lines of a list file
fn list_entries(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}

/// Parse every input, dropping repeats while keeping first-seen order
fn resolve_ids(inputs: &[String]) -> Result<Vec<String>> {
    let mut ids: Vec<String> = Vec::with_capacity(inputs.len());
    for input in inputs {
        let id = parse_file_id(input)?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_entries_skip_blanks_and_comments() {
        let text = "# converted last week\n\
                    https://docs.google.com/spreadsheets/d/abc123/edit\n\
                    \n\
                      xyz789  \n\
                    #old-id\n";
        assert_eq!(
            list_entries(text),
            vec![
                "https://docs.google.com/spreadsheets/d/abc123/edit".to_string(),
                "xyz789".to_string()
            ]
        );
    }

    #[test]
    fn test_resolve_ids_dedups_urls_and_ids() {
        let inputs = vec![
            "abc123".to_string(),
            "https://docs.google.com/spreadsheets/d/abc123/edit#gid=0".to_string(),
            "https://drive.google.com/open?id=def456".to_string(),
        ];
        assert_eq!(resolve_ids(&inputs).unwrap(), vec!["abc123", "def456"]);
    }

    #[test]
    fn test_resolve_ids_rejects_garbage() {
        assert!(resolve_ids(&["not an id".to_string()]).is_err());
    }

    #[test]
    fn test_read_list_file() {
        let path = std::env::temp_dir().join(format!("sheetbridge-urls-{}.txt", std::process::id()));
        std::fs::write(&path, "a1\n# skip\nb2\n").unwrap();
        let entries = read_list_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(entries, vec!["a1".to_string(), "b2".to_string()]);

        assert!(read_list_file(Path::new("/nonexistent/urls.txt")).is_err());
    }
}
