//! CLI command: `sheetbridge limits`
//!
//! Displays the configured ceilings, windows, call spacing, retry policy
//! and per-operation costs. Makes no remote calls.

use sheetbridge_core::QuotaCategory;

use crate::app::AppConfig;

/// Run the limits subcommand.
pub fn run(config: &AppConfig, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&config.governance)?);
        return Ok(());
    }

    let governance = &config.governance;
    println!();
    println!("  Quota Limits");
    println!("  {}", "-".repeat(72));
    println!(
        "  {:<30} {:>14} {:>10} {:>14}",
        "Category", "Ceiling", "Window", "Min Spacing"
    );
    println!("  {}", "-".repeat(72));
    for category in QuotaCategory::ALL {
        let limit = governance.limits.get(category);
        let window = if category.is_daily() {
            "1 day".to_string()
        } else {
            format!("{}s", limit.window_secs)
        };
        println!(
            "  {:<30} {:>14} {:>10} {:>12}ms",
            category.as_str(),
            limit.ceiling,
            window,
            governance.min_interval_ms.get(category).as_millis()
        );
    }

    let retry = &governance.retry;
    println!("  {}", "-".repeat(72));
    println!(
        "  Retry: {} attempts, {}ms base, {}ms cap, jitter {}",
        retry.max_attempts,
        retry.base_delay_ms,
        retry.max_delay_ms,
        if retry.jitter { "on" } else { "off" }
    );
    println!(
        "  Quota wait: up to {}s  |  Warning at {:.0}%  |  Progress every {} calls",
        governance.max_quota_wait_secs,
        governance.warning_ratio * 100.0,
        governance.progress_every
    );

    let costs = &governance.costs;
    println!(
        "  Costs: read {} / query {} / write {} / create {} / copy {} / convert {} / delete {}",
        costs.read, costs.query, costs.write, costs.create, costs.copy, costs.convert, costs.delete
    );
    println!();
    Ok(())
}
