//! Message classifier — new credit request vs. manager decision.

use tracing::{debug, info};

use super::model::{ClassifiedEvent, Decision, InboundEvent, title_case};
use crate::error::RelayError;

/// Routes inbound events by sender identity against the manager set.
#[derive(Debug, Clone)]
pub struct Classifier {
    managers: Vec<String>,
}

impl Classifier {
    pub fn new(managers: Vec<String>) -> Self {
        Self { managers }
    }

    /// Exact-match membership in the manager set.
    pub fn is_manager(&self, address: &str) -> bool {
        self.managers.iter().any(|m| m == address)
    }

    /// Classify a single inbound event.
    ///
    /// Fails only when the sender or provider message id is missing.
    pub fn classify(&self, event: &InboundEvent) -> Result<ClassifiedEvent, RelayError> {
        let sender = event
            .sender()
            .ok_or(RelayError::MalformedEvent { field: "From" })?;
        let message_id = event
            .message_id()
            .ok_or(RelayError::MalformedEvent { field: "MessageSid" })?;

        if !self.is_manager(sender) {
            let requester_name = title_case(event.profile_name().unwrap_or(sender));
            info!(
                message_id = %message_id,
                sender = %sender,
                requester = %requester_name,
                "New credit request"
            );
            return Ok(ClassifiedEvent::NewRequest {
                requester_number: sender.to_string(),
                requester_name,
                raw_text: event.text().to_string(),
            });
        }

        let Some(outcome) = Decision::from_reply(event.text()) else {
            debug!(
                message_id = %message_id,
                sender = %sender,
                "Ignoring manager message without a decision"
            );
            return Ok(ClassifiedEvent::Ignored);
        };

        let Some(correlation_key) = event.reply_to() else {
            info!(
                message_id = %message_id,
                sender = %sender,
                decision = %outcome,
                "Ignoring manager decision that does not reply to a request"
            );
            return Ok(ClassifiedEvent::Ignored);
        };

        Ok(ClassifiedEvent::Decision {
            correlation_key: correlation_key.to_string(),
            outcome,
            decider_number: sender.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANAGER: &str = "whatsapp:+900";

    fn classifier() -> Classifier {
        Classifier::new(vec![MANAGER.into(), "whatsapp:+901".into()])
    }

    fn event(from: &str, body: &str) -> InboundEvent {
        InboundEvent {
            from: Some(from.into()),
            body: Some(body.into()),
            sms_message_sid: Some("SMinbound".into()),
            profile_name: Some("bob smith".into()),
            ..Default::default()
        }
    }

    #[test]
    fn non_manager_is_new_request() {
        let result = classifier().classify(&event("+100", "I need credit")).unwrap();
        assert_eq!(
            result,
            ClassifiedEvent::NewRequest {
                requester_number: "+100".into(),
                requester_name: "Bob Smith".into(),
                raw_text: "I need credit".into(),
            }
        );
    }

    #[test]
    fn non_manager_saying_approve_is_still_new_request() {
        let result = classifier().classify(&event("+100", "approve")).unwrap();
        assert!(matches!(result, ClassifiedEvent::NewRequest { .. }));
    }

    #[test]
    fn missing_profile_name_falls_back_to_sender() {
        let mut ev = event("+100", "hi");
        ev.profile_name = None;
        match classifier().classify(&ev).unwrap() {
            ClassifiedEvent::NewRequest { requester_name, .. } => {
                assert_eq!(requester_name, "+100")
            }
            other => panic!("Expected NewRequest, got {other:?}"),
        }
    }

    #[test]
    fn manager_approve_reply_is_decision() {
        let mut ev = event(MANAGER, "Approve");
        ev.original_replied_message_sid = Some("SMforward12345".into());
        assert_eq!(
            classifier().classify(&ev).unwrap(),
            ClassifiedEvent::Decision {
                correlation_key: "SMforward12345".into(),
                outcome: Decision::Approved,
                decider_number: MANAGER.into(),
            }
        );
    }

    #[test]
    fn secondary_manager_decline_is_decision() {
        let mut ev = event("whatsapp:+901", "DECLINE");
        ev.original_replied_message_sid = Some("SMk".into());
        assert!(matches!(
            classifier().classify(&ev).unwrap(),
            ClassifiedEvent::Decision {
                outcome: Decision::Declined,
                ..
            }
        ));
    }

    #[test]
    fn manager_inexact_text_is_ignored() {
        let mut ev = event(MANAGER, "approved");
        ev.original_replied_message_sid = Some("SMk".into());
        assert_eq!(classifier().classify(&ev).unwrap(), ClassifiedEvent::Ignored);
    }

    #[test]
    fn manager_decision_without_reply_is_ignored() {
        let ev = event(MANAGER, "approve");
        assert_eq!(classifier().classify(&ev).unwrap(), ClassifiedEvent::Ignored);
    }

    #[test]
    fn manager_match_is_exact() {
        let c = classifier();
        assert!(c.is_manager("whatsapp:+900"));
        assert!(!c.is_manager("+900"));
        assert!(!c.is_manager("whatsapp:+9000"));
    }

    #[test]
    fn missing_sender_is_malformed() {
        let mut ev = event("", "hello");
        ev.from = None;
        let err = classifier().classify(&ev).unwrap_err();
        assert!(matches!(err, RelayError::MalformedEvent { field: "From" }));
    }

    #[test]
    fn missing_message_id_is_malformed() {
        let mut ev = event("+100", "hello");
        ev.sms_message_sid = None;
        let err = classifier().classify(&ev).unwrap_err();
        assert!(matches!(err, RelayError::MalformedEvent { field: "MessageSid" }));
    }
}
