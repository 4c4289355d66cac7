use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::timeout;
use volt_core::payment::{GatewayStatus, PaymentGateway};

use crate::statemachine::{ConfirmOutcome, OrderStateMachine};

/// Outcome counters for one sweep, for logs and tests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepStats {
    pub polled: usize,
    pub settled: usize,
    pub failed: usize,
    pub still_pending: usize,
    pub transport_errors: usize,
}

/// Background bridge between the async gateway and the state machine.
/// Sweeps every order awaiting external confirmation; orders leave the
/// sweep set the moment their payment goes terminal (settled here, paid
/// elsewhere, or cancelled), so a late poll can never resurrect one.
pub struct PaymentReconciler {
    engine: Arc<OrderStateMachine>,
    gateway: Arc<dyn PaymentGateway>,
    poll_timeout: Duration,
}

impl PaymentReconciler {
    pub fn new(
        engine: Arc<OrderStateMachine>,
        gateway: Arc<dyn PaymentGateway>,
        poll_timeout: Duration,
    ) -> Self {
        Self {
            engine,
            gateway,
            poll_timeout,
        }
    }

    /// One pass over the pending set. Transport errors are logged and
    /// retried on the next tick; only an explicit gateway `FAIL` marks
    /// a payment failed. Per-order failures never stop the sweep.
    pub async fn sweep_once(&self) -> SweepStats {
        let mut stats = SweepStats::default();

        for intent in self.engine.pending_gateway_intents() {
            stats.polled += 1;
            let status = match timeout(
                self.poll_timeout,
                self.gateway.check_status(&intent.gateway_order_id),
            )
            .await
            {
                Ok(Ok(status)) => status,
                Ok(Err(e)) => {
                    tracing::warn!(
                        order_id = %intent.order_id,
                        gateway_order_id = %intent.gateway_order_id,
                        error = %e,
                        "gateway poll failed, will retry next tick"
                    );
                    stats.transport_errors += 1;
                    continue;
                }
                Err(_) => {
                    tracing::warn!(
                        order_id = %intent.order_id,
                        gateway_order_id = %intent.gateway_order_id,
                        "gateway poll timed out, will retry next tick"
                    );
                    stats.transport_errors += 1;
                    continue;
                }
            };

            match status {
                GatewayStatus::Pending => {
                    self.engine.touch_intent(intent.order_id);
                    stats.still_pending += 1;
                }
                GatewayStatus::Success => {
                    let outcome = ConfirmOutcome::Success {
                        transaction_id: Some(intent.gateway_order_id.clone()),
                    };
                    match self.engine.confirm_payment(intent.order_id, outcome).await {
                        Ok(_) => stats.settled += 1,
                        Err(e) => {
                            tracing::error!(
                                order_id = %intent.order_id,
                                error = %e,
                                "failed to apply gateway success"
                            );
                        }
                    }
                }
                GatewayStatus::Fail => {
                    let outcome = ConfirmOutcome::Fail {
                        reason: "gateway reported failure".into(),
                    };
                    match self.engine.confirm_payment(intent.order_id, outcome).await {
                        Ok(_) => stats.failed += 1,
                        Err(e) => {
                            tracing::error!(
                                order_id = %intent.order_id,
                                error = %e,
                                "failed to apply gateway failure"
                            );
                        }
                    }
                }
            }
        }

        stats
    }

    /// Poll loop. Exits when the shutdown channel flips to true or the
    /// sender is dropped.
    pub async fn run(&self, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(interval);
        tracing::info!(interval_ms = interval.as_millis() as u64, "payment reconciler started");
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let stats = self.sweep_once().await;
                    if stats.polled > 0 {
                        tracing::debug!(?stats, "reconciler sweep complete");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("payment reconciler stopping");
                        break;
                    }
                }
            }
        }
    }
}
