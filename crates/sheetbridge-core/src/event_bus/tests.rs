use super::*;
use crate::orchestrator::{JobState, Tier};
use crate::quota::{OutcomeTallies, QuotaCategory};
use uuid::Uuid;

#[tokio::test]
async fn test_multiple_subscribers() {
    let bus = EventBus::new(16);
    let mut rx1 = bus.subscribe();
    let mut rx2 = bus.subscribe();

    let job_id = Uuid::new_v4();
    let count = bus.publish(GovernanceEvent::JobFinished {
        job_id,
        state: JobState::Succeeded,
        final_artifact: Some("sheet-1".to_string()),
    });
    assert_eq!(count, 2);

    assert_eq!(rx1.recv().await.unwrap().job_id(), Some(job_id));
    assert_eq!(rx2.recv().await.unwrap().job_id(), Some(job_id));
}

#[test]
fn test_publish_no_subscribers() {
    let bus = EventBus::default();
    let count = bus.publish(GovernanceEvent::QuotaWarning {
        category: QuotaCategory::DriveQueries100s,
        usage: 18_000,
        ceiling: 20_000,
    });
    assert_eq!(count, 0);
}

#[tokio::test]
async fn test_event_ordering() {
    let bus = EventBus::new(16);
    let mut rx = bus.subscribe();
    let job_id = Uuid::new_v4();

    bus.publish(GovernanceEvent::TierTransition {
        job_id,
        from: Tier::Standard,
        to: Tier::Enhanced,
        reason: "file too large".to_string(),
    });
    bus.publish(GovernanceEvent::CleanupFailed {
        job_id,
        artifact_id: "uploaded-1".to_string(),
        message: "permission denied".to_string(),
    });

    match rx.recv().await.unwrap() {
        GovernanceEvent::TierTransition { from, to, .. } => {
            assert_eq!(from, Tier::Standard);
            assert_eq!(to, Tier::Enhanced);
        }
        other => panic!("expected TierTransition, got: {:?}", other),
    }
    match rx.recv().await.unwrap() {
        GovernanceEvent::CleanupFailed { artifact_id, .. } => {
            assert_eq!(artifact_id, "uploaded-1");
        }
        other => panic!("expected CleanupFailed, got: {:?}", other),
    }
}

#[test]
fn test_event_serialization() {
    let event = GovernanceEvent::CallsProgress {
        category: QuotaCategory::DriveRequests100s,
        calls: 20,
        tallies: OutcomeTallies {
            success: 19,
            transient: 1,
            ..OutcomeTallies::default()
        },
    };
    let json = serde_json::to_string(&event).unwrap();
    assert!(json.contains("\"type\":\"calls_progress\""));
    assert!(json.contains("\"category\":\"drive_requests_100s\""));
    assert!(json.contains("\"success\":19"));
    assert_eq!(event.job_id(), None);
}
