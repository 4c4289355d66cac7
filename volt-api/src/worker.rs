use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use volt_core::payment::PaymentGateway;
use volt_order::{OrderStateMachine, PaymentReconciler};

use crate::config::ReconcilerConfig;

/// Spawn the payment reconciler on its own task. The returned sender is
/// the shutdown handle; send `true` (or drop it) to stop the loop.
pub fn spawn_reconciler(
    engine: Arc<OrderStateMachine>,
    gateway: Arc<dyn PaymentGateway>,
    config: &ReconcilerConfig,
) -> watch::Sender<bool> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let interval = Duration::from_secs(config.poll_interval_secs);
    let poll_timeout = Duration::from_secs(config.poll_timeout_secs);

    tokio::spawn(async move {
        let reconciler = PaymentReconciler::new(engine, gateway, poll_timeout);
        reconciler.run(interval, shutdown_rx).await;
    });

    shutdown_tx
}
