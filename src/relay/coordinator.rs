//! Approval coordinator — forwards requests, applies decisions, and owns the
//! bounded wait between the two.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::{error, info, warn};

use super::model::{
    ApprovalOutcome, ClassifiedEvent, Decision, FORWARD_TEMPLATE, HandleResult, PendingRequest,
};
use super::store::CorrelationStore;
use crate::channels::Notifier;
use crate::config::CoordinatorConfig;
use crate::error::RelayError;

/// Sole writer of the correlation store.
pub struct Coordinator {
    store: Arc<CorrelationStore>,
    notifier: Arc<dyn Notifier>,
    primary_manager: String,
    config: CoordinatorConfig,
}

impl Coordinator {
    pub fn new(
        store: Arc<CorrelationStore>,
        notifier: Arc<dyn Notifier>,
        primary_manager: impl Into<String>,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            store,
            notifier,
            primary_manager: primary_manager.into(),
            config,
        }
    }

    pub fn store(&self) -> &Arc<CorrelationStore> {
        &self.store
    }

    /// Handle one classified event to completion.
    ///
    /// New requests are forwarded and then awaited for up to the configured
    /// timeout before this returns.
    pub async fn handle(&self, event: ClassifiedEvent) -> Result<HandleResult, RelayError> {
        match event {
            ClassifiedEvent::NewRequest {
                requester_number,
                requester_name,
                raw_text,
            } => {
                let pending = self
                    .forward(requester_number, requester_name, raw_text)
                    .await?;
                let correlation_key = pending.correlation_key().to_string();
                let outcome = pending.wait().await;
                Ok(HandleResult::Resolved {
                    correlation_key,
                    outcome,
                })
            }
            ClassifiedEvent::Decision {
                correlation_key,
                outcome,
                decider_number,
            } => {
                self.apply_decision(&correlation_key, outcome, &decider_number)
                    .await
            }
            ClassifiedEvent::Ignored => Ok(HandleResult::Ignored),
        }
    }

    /// Send the approval request to the primary manager and register it.
    ///
    /// The forward's provider message id becomes the correlation key.
    pub async fn forward(
        &self,
        requester_number: String,
        requester_name: String,
        raw_text: String,
    ) -> Result<PendingApproval, RelayError> {
        let correlation_key = self
            .notifier
            .send(FORWARD_TEMPLATE, &self.primary_manager, &[requester_name.as_str()])
            .await
            .inspect_err(|e| {
                error!(
                    requester = %requester_number,
                    error = %e,
                    "Failed to forward credit request"
                )
            })?;

        let request = PendingRequest::new(
            correlation_key.clone(),
            requester_number,
            requester_name,
            raw_text,
        );
        let receiver = self.store.insert(request).await.ok_or_else(|| {
            RelayError::DuplicateCorrelation {
                key: correlation_key.clone(),
            }
        })?;

        info!(
            correlation_key = %correlation_key,
            timeout_secs = self.config.approval_timeout.as_secs(),
            "Awaiting manager decision"
        );

        Ok(PendingApproval {
            correlation_key,
            receiver,
            store: Arc::clone(&self.store),
            notifier: Arc::clone(&self.notifier),
            timeout: self.config.approval_timeout,
            notify_on_expiry: self.config.notify_on_expiry,
        })
    }

    /// Apply a manager decision and tell the requester.
    ///
    /// Unknown or already-consumed keys are a no-op.
    pub async fn apply_decision(
        &self,
        correlation_key: &str,
        decision: Decision,
        decider_number: &str,
    ) -> Result<HandleResult, RelayError> {
        let Some(request) = self.store.resolve(correlation_key, decision).await else {
            info!(
                correlation_key = %correlation_key,
                decider = %decider_number,
                "Decision for unknown or resolved request ignored"
            );
            return Ok(HandleResult::UnknownCorrelation {
                correlation_key: correlation_key.to_string(),
            });
        };

        info!(
            correlation_key = %correlation_key,
            decider = %decider_number,
            decision = %decision,
            requester = %request.requester_number,
            "Decision applied"
        );

        let message = request.status_message(&decision.to_string());
        self.notifier
            .send(&message, &request.requester_number, &[])
            .await
            .inspect_err(|e| {
                error!(
                    correlation_key = %correlation_key,
                    error = %e,
                    "Failed to notify requester of decision"
                )
            })?;

        Ok(HandleResult::Applied {
            correlation_key: correlation_key.to_string(),
            decision,
        })
    }
}

/// A forwarded request whose decision has not been awaited yet.
pub struct PendingApproval {
    correlation_key: String,
    receiver: oneshot::Receiver<Decision>,
    store: Arc<CorrelationStore>,
    notifier: Arc<dyn Notifier>,
    timeout: Duration,
    notify_on_expiry: bool,
}

impl PendingApproval {
    pub fn correlation_key(&self) -> &str {
        &self.correlation_key
    }

    /// Wait for the decision, up to the timeout.
    ///
    /// On expiry the entry is dropped from the store. If a decision consumed
    /// the entry in the meantime, that decision wins.
    pub async fn wait(mut self) -> ApprovalOutcome {
        let result = tokio::time::timeout(self.timeout, &mut self.receiver).await;
        match result {
            Ok(Ok(decision)) => {
                info!(correlation_key = %self.correlation_key, decision = %decision, "Request resolved");
                decision.into()
            }
            Ok(Err(_)) => {
                // Entry left the store without a decision.
                warn!(correlation_key = %self.correlation_key, "Pending request dropped");
                ApprovalOutcome::TimedOut
            }
            Err(_) => self.expire().await,
        }
    }

    async fn expire(mut self) -> ApprovalOutcome {
        let Some(request) = self.store.remove(&self.correlation_key).await else {
            // resolve() sends while holding the store lock, so a consumed
            // entry always has its decision ready here.
            return match self.receiver.try_recv() {
                Ok(decision) => decision.into(),
                Err(_) => ApprovalOutcome::TimedOut,
            };
        };

        info!(
            correlation_key = %self.correlation_key,
            requester = %request.requester_number,
            "Approval timed out"
        );

        if self.notify_on_expiry {
            let message = request.status_message("Expired");
            if let Err(e) = self
                .notifier
                .send(&message, &request.requester_number, &[])
                .await
            {
                error!(
                    correlation_key = %self.correlation_key,
                    error = %e,
                    "Failed to notify requester of expiry"
                );
            }
        }

        ApprovalOutcome::TimedOut
    }
}
