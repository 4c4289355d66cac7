use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use volt_api::adapters::{GhnCarrier, QrGateway};
use volt_api::config::Config;
use volt_api::{app, worker, AppState};
use volt_core::catalog::InMemoryCatalog;
use volt_core::notify::NoopNotifier;
use volt_core::payment::{MockGateway, PaymentGateway};
use volt_core::renderer::StubRenderer;
use volt_core::shipping::{MockCarrier, ShippingCarrier};
use volt_order::{ContractCoordinator, OrderStateMachine, OrderTimeline, WalletLedger};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "volt_api=debug,volt_order=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("failed to load config")?;
    tracing::info!(port = config.server.port, "starting volt API");

    let external_timeout = Duration::from_secs(config.engine.external_timeout_secs);

    let carrier: Arc<dyn ShippingCarrier> = if config.carrier.mock {
        tracing::info!("using mock shipping carrier");
        Arc::new(MockCarrier::new(15_000, 6_000))
    } else {
        Arc::new(GhnCarrier::new(
            config.carrier.base_url.clone(),
            config.carrier.token.clone(),
            config.carrier.shop_id,
            external_timeout,
        ))
    };

    let gateway: Arc<dyn PaymentGateway> = if config.gateway.mock {
        tracing::info!("using mock payment gateway");
        Arc::new(MockGateway::new())
    } else {
        Arc::new(QrGateway::new(
            config.gateway.base_url.clone(),
            config.gateway.api_key.clone(),
            external_timeout,
        ))
    };

    let engine = Arc::new(OrderStateMachine::new(
        Arc::new(InMemoryCatalog::new()),
        carrier,
        gateway.clone(),
        Arc::new(NoopNotifier),
        Arc::new(WalletLedger::new()),
        Arc::new(OrderTimeline::new()),
        Arc::new(ContractCoordinator::new(Arc::new(StubRenderer))),
        config.engine.to_engine_config(),
    ));

    let shutdown_tx = worker::spawn_reconciler(engine.clone(), gateway, &config.reconciler);

    let state = AppState::new(engine);
    let app = app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("server error")?;

    let _ = shutdown_tx.send(true);
    Ok(())
}
