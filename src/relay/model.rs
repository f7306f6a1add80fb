//! Relay data model — inbound events, pending requests, and outcomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of trailing correlation-key characters shown as the ticket id.
pub const TICKET_SUFFIX_LEN: usize = 5;

/// Forwarding template sent to the primary manager.
pub const FORWARD_TEMPLATE: &str = "{{1}} is requesting for credit.";

/// A single webhook call from the messaging provider.
///
/// Field names follow Twilio's webhook parameters. Every field is optional
/// at this layer; the classifier decides what is required.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InboundEvent {
    #[serde(rename = "From", default)]
    pub from: Option<String>,
    #[serde(rename = "Body", default)]
    pub body: Option<String>,
    #[serde(rename = "SmsMessageSid", default)]
    pub sms_message_sid: Option<String>,
    #[serde(rename = "MessageSid", default)]
    pub message_sid: Option<String>,
    #[serde(rename = "ProfileName", default)]
    pub profile_name: Option<String>,
    #[serde(rename = "OriginalRepliedMessageSid", default)]
    pub original_replied_message_sid: Option<String>,
}

impl InboundEvent {
    /// Provider id of this message, preferring `SmsMessageSid`.
    pub fn message_id(&self) -> Option<&str> {
        non_empty(&self.sms_message_sid).or_else(|| non_empty(&self.message_sid))
    }

    pub fn sender(&self) -> Option<&str> {
        non_empty(&self.from)
    }

    pub fn reply_to(&self) -> Option<&str> {
        non_empty(&self.original_replied_message_sid)
    }

    pub fn profile_name(&self) -> Option<&str> {
        non_empty(&self.profile_name)
    }

    pub fn text(&self) -> &str {
        self.body.as_deref().unwrap_or_default()
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// A manager's verdict on a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approved,
    Declined,
}

impl Decision {
    /// Parse a manager reply. Case-insensitive, surrounding whitespace ignored,
    /// otherwise exact.
    pub fn from_reply(text: &str) -> Option<Self> {
        match text.trim().to_lowercase().as_str() {
            "approve" => Some(Self::Approved),
            "decline" => Some(Self::Declined),
            _ => None,
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Approved => write!(f, "Approved"),
            Self::Declined => write!(f, "Declined"),
        }
    }
}

/// Decision state of a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionState {
    #[default]
    Unset,
    Decided(Decision),
}

/// Result of classifying one inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifiedEvent {
    /// A non-manager asking for credit.
    NewRequest {
        requester_number: String,
        requester_name: String,
        raw_text: String,
    },
    /// A manager approving or declining an earlier forward.
    Decision {
        correlation_key: String,
        outcome: Decision,
        decider_number: String,
    },
    /// Nothing to do.
    Ignored,
}

/// A credit request awaiting a manager decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingRequest {
    /// Provider id of the forwarded approval message.
    pub correlation_key: String,
    pub requester_number: String,
    /// Title-cased display name.
    pub requester_name: String,
    pub decision: DecisionState,
    /// Original inbound text, kept for diagnostics.
    pub raw_text: String,
    pub created_at: DateTime<Utc>,
}

impl PendingRequest {
    pub fn new(
        correlation_key: impl Into<String>,
        requester_number: impl Into<String>,
        requester_name: impl Into<String>,
        raw_text: impl Into<String>,
    ) -> Self {
        Self {
            correlation_key: correlation_key.into(),
            requester_number: requester_number.into(),
            requester_name: requester_name.into(),
            decision: DecisionState::Unset,
            raw_text: raw_text.into(),
            created_at: Utc::now(),
        }
    }

    /// Upper-cased tail of the correlation key shown to requesters.
    pub fn ticket_id(&self) -> String {
        ticket_suffix(&self.correlation_key)
    }

    /// Message announcing a terminal status to the requester.
    pub fn status_message(&self, status: &str) -> String {
        format!(
            "[Ticket ID: #{}] Status: {} | Requester: {}",
            self.ticket_id(),
            status,
            self.requester_name
        )
    }
}

/// Last [`TICKET_SUFFIX_LEN`] characters of `key`, upper-cased.
pub fn ticket_suffix(key: &str) -> String {
    let count = key.chars().count();
    key.chars()
        .skip(count.saturating_sub(TICKET_SUFFIX_LEN))
        .collect::<String>()
        .to_uppercase()
}

/// Title-case a display name: first letter of every word upper-cased,
/// the rest lower-cased. Any non-alphabetic character starts a new word.
pub fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut at_word_start = true;
    for c in name.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

/// Terminal outcome of a forwarded request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalOutcome {
    Approved,
    Declined,
    TimedOut,
}

impl From<Decision> for ApprovalOutcome {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Approved => Self::Approved,
            Decision::Declined => Self::Declined,
        }
    }
}

/// What the coordinator did with a classified event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleResult {
    /// A new request was forwarded and reached a terminal outcome.
    Resolved {
        correlation_key: String,
        outcome: ApprovalOutcome,
    },
    /// A decision was applied to a pending request.
    Applied {
        correlation_key: String,
        decision: Decision,
    },
    /// The decision referenced no pending request.
    UnknownCorrelation { correlation_key: String },
    /// Nothing to do.
    Ignored,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_case_words() {
        assert_eq!(title_case("bob smith"), "Bob Smith");
        assert_eq!(title_case("alice"), "Alice");
        assert_eq!(title_case("mARY-jane o'neil"), "Mary-Jane O'Neil");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn ticket_suffix_last_five_upper() {
        assert_eq!(ticket_suffix("SM0123456789abcdef"), "BCDEF");
        assert_eq!(ticket_suffix("ab"), "AB");
    }

    #[test]
    fn status_message_format() {
        let req = PendingRequest::new("SMxyz12abcde", "whatsapp:+100", "Bob Smith", "I need credit");
        assert_eq!(
            req.status_message("Approved"),
            "[Ticket ID: #ABCDE] Status: Approved | Requester: Bob Smith"
        );
        assert_eq!(req.decision, DecisionState::Unset);
    }

    #[test]
    fn decision_from_reply_is_exact() {
        assert_eq!(Decision::from_reply("Approve"), Some(Decision::Approved));
        assert_eq!(Decision::from_reply(" DECLINE\n"), Some(Decision::Declined));
        assert_eq!(Decision::from_reply("approved"), None);
        assert_eq!(Decision::from_reply("approve please"), None);
        assert_eq!(Decision::from_reply(""), None);
    }

    #[test]
    fn inbound_event_prefers_sms_sid() {
        let event = InboundEvent {
            sms_message_sid: Some("SM1".into()),
            message_sid: Some("SM2".into()),
            ..Default::default()
        };
        assert_eq!(event.message_id(), Some("SM1"));

        let event = InboundEvent {
            sms_message_sid: Some("".into()),
            message_sid: Some("SM2".into()),
            ..Default::default()
        };
        assert_eq!(event.message_id(), Some("SM2"));
    }

    #[test]
    fn inbound_event_deserializes_twilio_fields() {
        let event: InboundEvent = serde_json::from_value(serde_json::json!({
            "From": "whatsapp:+100",
            "Body": "I need credit",
            "SmsMessageSid": "SMabc",
            "ProfileName": "bob smith",
            "AccountSid": "AC123"
        }))
        .unwrap();
        assert_eq!(event.sender(), Some("whatsapp:+100"));
        assert_eq!(event.text(), "I need credit");
        assert_eq!(event.reply_to(), None);
        assert_eq!(event.profile_name(), Some("bob smith"));
    }
}
