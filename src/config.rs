//! Configuration types, assembled from the process environment at startup.

use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Channel prefix Twilio uses for WhatsApp addresses.
pub const WHATSAPP_PREFIX: &str = "whatsapp:";

/// Default Twilio REST base URL.
pub const DEFAULT_TWILIO_API_BASE: &str = "https://api.twilio.com";

/// Approval wait behaviour.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// How long a forwarded request waits for a manager decision.
    pub approval_timeout: Duration,
    /// Send the requester an "Expired" notice when the wait times out.
    pub notify_on_expiry: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            approval_timeout: Duration::from_secs(30),
            notify_on_expiry: false,
        }
    }
}

/// Twilio credentials and originating address.
#[derive(Debug, Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: SecretString,
    /// Originating WhatsApp address, always carrying the `whatsapp:` prefix.
    pub from_address: String,
    pub api_base: String,
}

/// Full relay configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub twilio: TwilioConfig,
    /// Manager that receives forwarded credit requests.
    pub primary_manager: String,
    /// Every address allowed to approve or decline, primary included.
    pub managers: Vec<String>,
    pub port: u16,
    /// Hold the webhook response until the request resolves.
    pub sync_wait: bool,
    pub coordinator: CoordinatorConfig,
}

impl RelayConfig {
    /// Build config from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String, ConfigError> {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
        };

        let account_sid = required("TWILIO_ACCOUNT_SID")?;
        let auth_token = SecretString::from(required("TWILIO_AUTH_TOKEN")?);
        let from_address = whatsapp_address(&required("TWILIO_WHATSAPP_NUMBER")?);
        let primary_manager = whatsapp_address(&required("MY_NUMBER")?);

        let mut managers = vec![primary_manager.clone()];
        for extra in lookup("MANAGER_NUMBERS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            let address = whatsapp_address(extra);
            if !managers.contains(&address) {
                managers.push(address);
            }
        }

        let api_base = lookup("TWILIO_API_BASE")
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_TWILIO_API_BASE.to_string());

        let port = parse_var(&lookup, "RELAY_PORT", 5001u16)?;
        let timeout_secs = parse_var(&lookup, "RELAY_APPROVAL_TIMEOUT_SECS", 30u64)?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "RELAY_APPROVAL_TIMEOUT_SECS".into(),
                message: "must be greater than zero".into(),
            });
        }
        let sync_wait = parse_bool(&lookup, "RELAY_SYNC_WAIT")?;
        let notify_on_expiry = parse_bool(&lookup, "RELAY_NOTIFY_ON_EXPIRY")?;

        Ok(Self {
            twilio: TwilioConfig {
                account_sid,
                auth_token,
                from_address,
                api_base,
            },
            primary_manager,
            managers,
            port,
            sync_wait,
            coordinator: CoordinatorConfig {
                approval_timeout: Duration::from_secs(timeout_secs),
                notify_on_expiry,
            },
        })
    }
}

/// Prefix a bare number with `whatsapp:` unless it already carries it.
pub fn whatsapp_address(number: &str) -> String {
    let number = number.trim();
    if number.starts_with(WHATSAPP_PREFIX) {
        number.to_string()
    } else {
        format!("{WHATSAPP_PREFIX}{number}")
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key).map(|v| v.trim().to_string()) {
        None => Ok(default),
        Some(v) if v.is_empty() => Ok(default),
        Some(v) => v.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        }),
    }
}

fn parse_bool<F>(lookup: &F, key: &str) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        None | Some("") => Ok(false),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(other) => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a boolean, got '{other}'"),
        }),
    }
}
