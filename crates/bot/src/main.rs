//! `LoveSense` bot - Telegram front end plus status/admin HTTP API.
//!
//! Runs two front ends over one set of stores:
//!
//! - a teloxide long-polling dispatcher for chat users and the admin
//! - an axum HTTP API (`/health`, `/user_status/{uid}`, `/admin/*`)
//!
//! Both stop on Ctrl+C or SIGTERM; the stores are flushed before exit.
//! Missing `TELEGRAM_TOKEN` or `ADMIN_ID` is fatal at boot.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use lovesense_bot::config::BotConfig;
use lovesense_bot::generation::{ContentGenerator, HfClient};
use lovesense_bot::routes;
use lovesense_bot::services::AdminGate;
use lovesense_bot::state::AppState;
use lovesense_bot::telegram::{TelegramContext, TelegramNotifier, run_dispatcher};
use lovesense_core::SystemClock;
use secrecy::ExposeSecret;
use sentry::integrations::tracing as sentry_tracing;
use teloxide::Bot;
use tokio::sync::watch;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &BotConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            traces_sample_rate: config.sentry_traces_sample_rate,
            attach_stacktrace: true,
            send_default_pii: false,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = BotConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "lovesense_bot=info,tower_http=info".into());

    let json_layer = config
        .log_json
        .then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!config.log_json).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let bot = Bot::new(config.telegram.token.expose_secret());
    let notifier = Arc::new(TelegramNotifier::new(bot.clone(), config.admin_id));

    let state = AppState::open(
        &config.storage,
        AdminGate::new(config.admin_id),
        config.payment.clone(),
        Arc::new(SystemClock),
        notifier,
    )
    .await;

    let generator = HfClient::new(&config.generation)
        .expect("Failed to build content generation client");
    if !generator.is_configured() {
        tracing::warn!("HF_API_KEY not set, content generation is disabled");
    }
    let generator: Arc<dyn ContentGenerator> = Arc::new(generator);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    let dispatcher = tokio::spawn(run_dispatcher(
        bot,
        TelegramContext::new(state.clone(), generator),
        shutdown_rx.clone(),
    ));

    let app = routes::routes()
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state.clone())
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    let addr = config.socket_addr();
    tracing::info!("API listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    let mut http_shutdown = shutdown_rx;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = http_shutdown.changed().await;
        })
        .await
        .expect("Server error");

    if let Err(e) = dispatcher.await {
        tracing::error!(error = %e, "Telegram dispatcher task failed");
    }

    match state.flush().await {
        Ok(()) => tracing::info!("Stores flushed"),
        Err(e) => tracing::error!(error = %e, "Failed to flush stores on shutdown"),
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
