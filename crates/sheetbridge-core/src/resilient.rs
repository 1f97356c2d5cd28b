//! Resilient Call Wrapper
//!
//! Every remote call goes through [`ResilientCaller::execute`]:
//!
//! 1. wait for a governor slot
//! 2. ask the ledger for admission; on denial wait (bounded) and ask once more
//! 3. issue the call and record its outcome
//! 4. retry quota and transient failures with backoff, return fatal ones
//!
//! Cancellation is checked before every wait. A call already issued is
//! never interrupted.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use sheetbridge_drive::ErrorKind;

use crate::clock::Clock;
use crate::config::{GovernanceConfig, OperationCosts};
use crate::error::CallError;
use crate::event_bus::{EventBus, GovernanceEvent};
use crate::governor::RateGovernor;
use crate::quota::{CallOutcome, Decision, QuotaCategory, QuotaLedger, QuotaStatus};
use crate::retry::RetryConfig;

/// Composes the governor, ledger and retry policy around remote calls
#[derive(Debug)]
pub struct ResilientCaller {
    governor: RateGovernor,
    ledger: QuotaLedger,
    clock: Arc<dyn Clock>,
    retry: RetryConfig,
    max_quota_wait: Duration,
    progress_every: u64,
    costs: OperationCosts,
    events: EventBus,
    cancel: CancellationToken,
    issued: Mutex<HashMap<QuotaCategory, u64>>,
}

impl ResilientCaller {
    /// Build the ledger and governor from `config`
    #[must_use]
    pub fn new(config: &GovernanceConfig, clock: Arc<dyn Clock>, events: EventBus) -> Self {
        let ledger = QuotaLedger::new(config.limits.clone(), Arc::clone(&clock))
            .with_warning_ratio(config.warning_ratio)
            .with_event_bus(events.clone());
        let governor = RateGovernor::new(config.min_interval_ms.clone(), Arc::clone(&clock));

        Self {
            governor,
            ledger,
            clock,
            retry: config.retry.clone(),
            max_quota_wait: config.max_quota_wait(),
            progress_every: config.progress_every,
            costs: config.costs.clone(),
            events,
            cancel: CancellationToken::new(),
            issued: Mutex::new(HashMap::new()),
        }
    }

    /// Honor `token` before every wait
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// The quota ledger
    #[must_use]
    pub fn ledger(&self) -> &QuotaLedger {
        &self.ledger
    }

    /// Snapshot of quota usage
    #[must_use]
    pub fn status(&self) -> QuotaStatus {
        self.ledger.get_status()
    }

    /// Unit costs per operation type
    #[must_use]
    pub fn costs(&self) -> &OperationCosts {
        &self.costs
    }

    /// The event bus progress and warnings are published on
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Whether cancellation was requested
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Run `operation` under quota governance.
    ///
    /// `operation` is invoked once per attempt; `cost` is the number of daily
    /// units one attempt spends.
    pub async fn execute<T, F, Fut>(
        &self,
        category: QuotaCategory,
        cost: u64,
        mut operation: F,
    ) -> Result<T, CallError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = sheetbridge_drive::Result<T>>,
    {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            self.governor.wait_for_slot(category).await;
            self.admit(category, cost, attempt).await?;
            self.count_issued(category);

            let error = match operation().await {
                Ok(value) => {
                    self.ledger.record(category, cost, CallOutcome::Success);
                    if attempt > 1 {
                        debug!(category = %category, attempt, "Call succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) => e,
            };

            let kind = error.kind();
            self.ledger.record(category, cost, CallOutcome::from(kind));

            if kind == ErrorKind::Fatal {
                debug!(category = %category, error = %error, "Call failed, not retryable");
                return Err(CallError::Fatal {
                    attempts: attempt,
                    error,
                });
            }

            if attempt >= max_attempts {
                warn!(
                    category = %category,
                    attempts = attempt,
                    error = %error,
                    "Call failed, no more retries"
                );
                return Err(match kind {
                    ErrorKind::QuotaExceeded => CallError::QuotaExhausted {
                        category,
                        attempts: attempt,
                        retry_after: error.retry_after(),
                        message: error.to_string(),
                    },
                    _ => CallError::TransientFailureExhausted {
                        attempts: attempt,
                        last: error,
                    },
                });
            }

            let delay = self.backoff(attempt, error.retry_after());
            warn!(
                category = %category,
                attempt,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Call failed, retrying"
            );
            self.events.publish(GovernanceEvent::Retrying {
                category,
                attempt,
                delay_ms: delay.as_millis() as u64,
                kind,
            });
            self.sleep(delay).await?;
        }
    }

    /// Backoff after `attempt`, raised to a server hint when one was given
    fn backoff(&self, attempt: u32, hint: Option<Duration>) -> Duration {
        let delay = self.retry.calculate_delay(attempt);
        match hint {
            Some(hint) => delay.max(hint.min(self.max_quota_wait)),
            None => delay,
        }
    }

    async fn admit(&self, category: QuotaCategory, cost: u64, attempt: u32) -> Result<(), CallError> {
        let (refused_by, retry_after) = match self.ledger.admit(category, cost) {
            Decision::Allow => return Ok(()),
            Decision::Deny {
                category,
                retry_after,
            } => (category, retry_after),
        };

        let wait = retry_after.min(self.max_quota_wait);
        info!(
            category = %category,
            refused_by = %refused_by,
            wait_ms = wait.as_millis() as u64,
            "Quota ceiling reached, waiting for the window to reset"
        );
        self.sleep(wait).await?;

        match self.ledger.admit(category, cost) {
            Decision::Allow => Ok(()),
            Decision::Deny {
                category: refused_by,
                retry_after,
            } => {
                warn!(
                    category = %category,
                    refused_by = %refused_by,
                    retry_after_secs = retry_after.as_secs(),
                    "Quota still exhausted after waiting"
                );
                Err(CallError::QuotaExhausted {
                    category: refused_by,
                    attempts: attempt,
                    retry_after: Some(retry_after),
                    message: format!("{refused_by} ceiling reached"),
                })
            }
        }
    }

    fn count_issued(&self, category: QuotaCategory) {
        let calls = {
            let mut issued = self.issued.lock().unwrap_or_else(|e| e.into_inner());
            let calls = issued.entry(category).or_insert(0);
            *calls += 1;
            *calls
        };

        if self.progress_every > 0 && calls % self.progress_every == 0 {
            let tallies = self.ledger.tallies(category);
            info!(
                category = %category,
                calls,
                success = tallies.success,
                quota_rejected = tallies.quota_rejected,
                transient = tallies.transient,
                fatal = tallies.fatal,
                "Call progress"
            );
            self.events.publish(GovernanceEvent::CallsProgress {
                category,
                calls,
                tallies,
            });
        }
    }

    async fn sleep(&self, duration: Duration) -> Result<(), CallError> {
        if self.cancel.is_cancelled() {
            return Err(CallError::Cancelled);
        }
        tokio::select! {
            _ = self.clock.sleep(duration) => Ok(()),
            _ = self.cancel.cancelled() => Err(CallError::Cancelled),
        }
    }
}
