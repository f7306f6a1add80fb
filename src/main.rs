use std::sync::Arc;

use credit_relay::channels::{Notifier, TwilioNotifier};
use credit_relay::config::RelayConfig;
use credit_relay::relay::{Classifier, Coordinator, CorrelationStore, RelayState, relay_routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; the process environment may already be set
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = RelayConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!("  Required: TWILIO_ACCOUNT_SID, TWILIO_AUTH_TOKEN, TWILIO_WHATSAPP_NUMBER, MY_NUMBER");
        std::process::exit(1);
    });

    eprintln!("💳 Credit Relay v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Webhook: http://0.0.0.0:{}/webhook", config.port);
    eprintln!("   Primary manager: {}", config.primary_manager);
    eprintln!("   Managers: {}", config.managers.join(", "));
    eprintln!(
        "   Approval timeout: {}s (expiry notice: {}, wait mode: {})",
        config.coordinator.approval_timeout.as_secs(),
        if config.coordinator.notify_on_expiry { "on" } else { "off" },
        if config.sync_wait { "sync" } else { "background" },
    );

    let notifier: Arc<dyn Notifier> = Arc::new(TwilioNotifier::new(&config.twilio));
    let coordinator = Arc::new(Coordinator::new(
        CorrelationStore::new(),
        notifier,
        config.primary_manager.clone(),
        config.coordinator.clone(),
    ));
    let state = RelayState {
        classifier: Arc::new(Classifier::new(config.managers.clone())),
        coordinator,
        sync_wait: config.sync_wait,
    };

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    tracing::info!(port = config.port, "Credit relay listening");
    axum::serve(listener, relay_routes(state)).await?;

    Ok(())
}
