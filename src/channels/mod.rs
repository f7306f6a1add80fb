//! Outbound messaging — the send capability the relay depends on.

pub mod twilio;

use async_trait::async_trait;

use crate::error::ChannelError;

pub use twilio::TwilioNotifier;

/// A provider that can deliver a text message to a channel address.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Provider name, used in logs and errors.
    fn name(&self) -> &str;

    /// Deliver `body` verbatim to `recipient`, returning the provider message id.
    async fn deliver(&self, body: &str, recipient: &str) -> Result<String, ChannelError>;

    /// Render `text` with positional `{{n}}` substitutions and deliver it.
    ///
    /// With no substitutions the text goes out unchanged.
    async fn send(
        &self,
        text: &str,
        recipient: &str,
        substitutions: &[&str],
    ) -> Result<String, ChannelError> {
        let body = render_template(text, substitutions);
        let message_id = self.deliver(&body, recipient).await?;
        tracing::info!(
            channel = self.name(),
            recipient = %recipient,
            message_id = %message_id,
            "Message sent"
        );
        Ok(message_id)
    }
}

/// Replace `{{1}}`, `{{2}}`, … with the matching substitution.
///
/// Placeholders without a matching substitution are left as-is, and
/// substituted values are never re-scanned.
pub fn render_template(template: &str, substitutions: &[&str]) -> String {
    if substitutions.is_empty() {
        return template.to_string();
    }

    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let value = after.find("}}").and_then(|end| {
            after[..end]
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| substitutions.get(i))
                .map(|v| (*v, end))
        });

        match value {
            Some((v, end)) => {
                out.push_str(v);
                rest = &after[end + 2..];
            }
            None => {
                out.push_str("{{");
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbatim_without_substitutions() {
        assert_eq!(render_template("{{1}} is here", &[]), "{{1}} is here");
    }

    #[test]
    fn single_placeholder() {
        assert_eq!(
            render_template("{{1}} is requesting for credit.", &["Bob Smith"]),
            "Bob Smith is requesting for credit."
        );
    }

    #[test]
    fn every_placeholder_replaced() {
        assert_eq!(
            render_template("{{1}} owes {{2}}, ask {{1}}", &["Ada", "50"]),
            "Ada owes 50, ask Ada"
        );
    }

    #[test]
    fn unmatched_placeholder_kept() {
        assert_eq!(render_template("{{1}} and {{3}}", &["a", "b"]), "a and {{3}}");
        assert_eq!(render_template("{{0}} {{x}} {{", &["a"]), "{{0}} {{x}} {{");
    }

    #[test]
    fn substituted_value_not_rescanned() {
        assert_eq!(render_template("{{1}}-{{2}}", &["{{2}}", "b"]), "{{2}}-b");
    }
}
