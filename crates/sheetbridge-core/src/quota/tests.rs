//! Quota ledger tests

use super::*;
use crate::clock::{Clock, ManualClock};
use crate::config::{Limit, QuotaLimits};
use crate::event_bus::{EventBus, GovernanceEvent};
use std::sync::Arc;
use std::time::Duration;

fn ledger_with(limits: QuotaLimits) -> (QuotaLedger, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    (QuotaLedger::new(limits, clock.clone()), clock)
}

fn small_drive_limit(ceiling: u64) -> QuotaLimits {
    QuotaLimits::default().with_limit(QuotaCategory::DriveRequests100s, Limit::new(ceiling, 100))
}

fn issue(ledger: &QuotaLedger, category: QuotaCategory, cost: u64) -> Decision {
    let decision = ledger.admit(category, cost);
    if decision.is_allowed() {
        ledger.record(category, cost, CallOutcome::Success);
    }
    decision
}

#[test]
fn test_fourth_call_denied_until_window_passes() {
    let (ledger, clock) = ledger_with(small_drive_limit(3));
    let category = QuotaCategory::DriveRequests100s;

    for _ in 0..3 {
        assert_eq!(issue(&ledger, category, 1), Decision::Allow);
    }
    assert_eq!(
        ledger.admit(category, 1),
        Decision::Deny {
            category,
            retry_after: Duration::from_secs(100)
        }
    );

    clock.advance(Duration::from_secs(40));
    assert_eq!(
        ledger.admit(category, 1),
        Decision::Deny {
            category,
            retry_after: Duration::from_secs(60)
        }
    );

    clock.advance(Duration::from_secs(60));
    assert_eq!(issue(&ledger, category, 1), Decision::Allow);
    assert_eq!(ledger.usage(category), 1);
}

#[test]
fn test_record_counts_failed_calls() {
    let (ledger, _clock) = ledger_with(small_drive_limit(2));
    let category = QuotaCategory::DriveRequests100s;

    ledger.record(category, 1, CallOutcome::TransientError);
    ledger.record(category, 1, CallOutcome::FatalError);

    assert!(!ledger.admit(category, 1).is_allowed());
    let tallies = ledger.tallies(category);
    assert_eq!(tallies.transient, 1);
    assert_eq!(tallies.fatal, 1);
    assert_eq!(tallies.total(), 2);
}

#[test]
fn test_daily_budget_denies_even_with_window_headroom() {
    let limits = QuotaLimits::default()
        .with_limit(QuotaCategory::DriveDailyUnits, Limit::new(500, 86_400));
    let (ledger, clock) = ledger_with(limits);
    clock.advance(Duration::from_secs(3_600));

    assert!(issue(&ledger, QuotaCategory::DriveRequests100s, 200).is_allowed());
    assert!(issue(&ledger, QuotaCategory::DriveRequests100s, 200).is_allowed());
    assert_eq!(ledger.usage(QuotaCategory::DriveDailyUnits), 400);

    // 400 + 200 > 500, while the 100s window has used 2 of 1000
    assert_eq!(
        ledger.admit(QuotaCategory::DriveRequests100s, 200),
        Decision::Deny {
            category: QuotaCategory::DriveDailyUnits,
            retry_after: Duration::from_secs(82_800)
        }
    );
    assert!(ledger
        .admit(QuotaCategory::DriveRequests100s, 100)
        .is_allowed());
}

#[test]
fn test_daily_units_only_reset_at_day_boundary() {
    let (ledger, clock) = ledger_with(QuotaLimits::default());
    let daily = QuotaCategory::DriveDailyUnits;

    let mut previous = 0;
    for _ in 0..5 {
        ledger.record(QuotaCategory::DriveQueries100s, 7, CallOutcome::Success);
        clock.advance(Duration::from_secs(3_000));
        let usage = ledger.usage(daily);
        assert!(usage >= previous);
        previous = usage;
    }
    assert_eq!(previous, 35);

    clock.advance(Duration::from_secs(86_400));
    assert_eq!(ledger.usage(daily), 0);
}

#[test]
fn test_sheets_category_does_not_spend_daily_units() {
    let (ledger, _clock) = ledger_with(QuotaLimits::default());
    ledger.record(QuotaCategory::SheetsRequestsPerMinute, 50, CallOutcome::Success);

    assert_eq!(ledger.usage(QuotaCategory::SheetsRequestsPerMinute), 1);
    assert_eq!(ledger.usage(QuotaCategory::DriveDailyUnits), 0);
}

#[test]
fn test_status_is_read_only_and_reports_near_limit() {
    let (ledger, clock) = ledger_with(small_drive_limit(10));
    let category = QuotaCategory::DriveRequests100s;
    for _ in 0..9 {
        issue(&ledger, category, 1);
    }

    let status = ledger.get_status();
    let drive = status.get(category).unwrap();
    assert_eq!(drive.usage, 9);
    assert_eq!(drive.ceiling, 10);
    assert!(drive.near_limit);
    assert_eq!(drive.tallies.success, 9);
    assert_eq!(drive.resets_in_secs, Some(100));
    assert_eq!(status.near_limit(), vec![category]);
    assert!((drive.usage_ratio() - 0.9).abs() < f64::EPSILON);

    // An expired window reads as empty but the snapshot does not reset it
    clock.advance(Duration::from_secs(150));
    let later = ledger.get_status();
    assert_eq!(later.get(category).unwrap().usage, 0);
    assert_eq!(later.get(category).unwrap().resets_in_secs, None);
    assert_eq!(ledger.get_status(), later);
}

#[tokio::test]
async fn test_warning_published_once_per_window() {
    let clock = Arc::new(ManualClock::new());
    let bus = EventBus::new(16);
    let mut rx = bus.subscribe();
    let ledger = QuotaLedger::new(small_drive_limit(10), clock.clone()).with_event_bus(bus);

    for _ in 0..10 {
        ledger.record(QuotaCategory::DriveRequests100s, 1, CallOutcome::Success);
    }

    match rx.try_recv().unwrap() {
        GovernanceEvent::QuotaWarning {
            category,
            usage,
            ceiling,
        } => {
            assert_eq!(category, QuotaCategory::DriveRequests100s);
            assert_eq!(usage, 9);
            assert_eq!(ceiling, 10);
        }
        other => panic!("unexpected event: {other:?}"),
    }
    assert!(rx.try_recv().is_err());

    clock.advance(Duration::from_secs(100));
    for _ in 0..9 {
        ledger.record(QuotaCategory::DriveRequests100s, 1, CallOutcome::Success);
    }
    assert!(matches!(
        rx.try_recv().unwrap(),
        GovernanceEvent::QuotaWarning { usage: 9, .. }
    ));
}

#[test]
fn test_usage_window_refresh() {
    let clock = ManualClock::new();
    let limit = Limit::new(5, 100);
    let now = clock.now();
    let window = UsageWindow {
        window_start: Some(now),
        count_in_window: 4,
        ..UsageWindow::default()
    };
    let today = clock.today();

    let same = window.refreshed(QuotaCategory::DriveQueries100s, limit, now + Duration::from_secs(99), today);
    assert_eq!(same.count_in_window, 4);
    assert_eq!(same.remaining(limit, now + Duration::from_secs(99)), Duration::from_secs(1));

    let reset = window.refreshed(QuotaCategory::DriveQueries100s, limit, now + Duration::from_secs(100), today);
    assert_eq!(reset, UsageWindow::default());
}

#[test]
fn test_category_names_match_config_keys() {
    for category in QuotaCategory::ALL {
        assert_eq!(
            serde_json::to_string(&category).unwrap(),
            format!("\"{}\"", category.as_str())
        );
        let parsed: QuotaCategory =
            serde_json::from_str(&format!("\"{category}\"")).unwrap();
        assert_eq!(parsed, category);
    }
}
