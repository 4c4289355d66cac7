use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::timeout;
use uuid::Uuid;
use volt_core::catalog::{CatalogError, ProductCatalog, ProductCategory};
use volt_core::payment::{GatewayError, PaymentGateway};
use volt_core::shipping::{Address, ShippingCarrier, ShippingError};
use volt_core::Notifier;
use volt_shared::{Actor, NotificationEvent};

use crate::contract::ContractCoordinator;
use crate::meeting::{Meeting, MeetingError, MeetingPatch};
use crate::models::{
    Order, OrderKind, OrderStatus, PaymentIntent, PaymentMethod, PaymentStatus, ShippingInfo,
};
use crate::timeline::OrderTimeline;
use crate::wallet::{WalletError, WalletLedger};

/// Every legal status edge. Anything not listed here is rejected with
/// `InvalidTransition` and leaves order and ledger untouched.
pub fn can_transition(from: OrderStatus, to: OrderStatus) -> bool {
    use OrderStatus::*;
    matches!(
        (from, to),
        (Pending, Confirmed)
            | (Pending, Cancelled)
            | (Confirmed, Shipping)
            | (Confirmed, Cancelled)
            | (Confirmed, Refunded)
            | (Shipping, Delivered)
            | (DepositPending, DepositConfirmed)
            | (DepositPending, DepositCancelled)
            | (DepositConfirmed, DepositCancelled)
            | (DepositConfirmed, DepositRefunded)
    )
}

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("order not found: {0}")]
    NotFound(Uuid),

    #[error("product unavailable: {0}")]
    ProductUnavailable(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("invalid state transition from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("contract not signed for product {0}")]
    ContractNotSigned(Uuid),

    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: i64, available: i64 },

    #[error("shipping quote unavailable: {0}")]
    QuoteUnavailable(String),

    #[error("address not routable: {0}")]
    InvalidAddress(String),

    #[error("payment gateway unavailable: {0}")]
    GatewayUnavailable(String),

    #[error("contract renderer unavailable: {0}")]
    RendererUnavailable(String),

    #[error("operation not supported for this order kind")]
    WrongKind,

    #[error("ledger conflict: {0}")]
    LedgerConflict(String),
}

impl OrderError {
    /// Transient failures the caller may retry as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            OrderError::QuoteUnavailable(_)
                | OrderError::GatewayUnavailable(_)
                | OrderError::RendererUnavailable(_)
        )
    }
}

impl From<WalletError> for OrderError {
    fn from(err: WalletError) -> Self {
        match err {
            WalletError::InvalidAmount(v) => OrderError::InvalidAmount(v.to_string()),
            WalletError::InsufficientFunds { needed, available } => {
                OrderError::InsufficientFunds { needed, available }
            }
        }
    }
}

impl From<ShippingError> for OrderError {
    fn from(err: ShippingError) -> Self {
        match err {
            ShippingError::QuoteUnavailable(msg) => OrderError::QuoteUnavailable(msg),
            ShippingError::InvalidAddress(msg) => OrderError::InvalidAddress(msg),
        }
    }
}

impl From<GatewayError> for OrderError {
    fn from(err: GatewayError) -> Self {
        OrderError::GatewayUnavailable(err.to_string())
    }
}

/// Tunables for fee computation and external calls.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Commission charged on the goods subtotal, in basis points.
    pub commission_rate_bps: i64,
    /// Vehicles skip the carrier and get this flat fee.
    pub vehicle_flat_fee: i64,
    pub carrier_name: String,
    /// Upper bound for any carrier or gateway call.
    pub external_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            commission_rate_bps: 250,
            vehicle_flat_fee: 2_000_000,
            carrier_name: "GHN".to_string(),
            external_timeout: Duration::from_secs(10),
        }
    }
}

/// Request to open an order.
#[derive(Debug, Clone)]
pub struct CreateOrder {
    pub buyer_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i64,
    pub kind: NewOrderKind,
    pub method: PaymentMethod,
}

#[derive(Debug, Clone)]
pub enum NewOrderKind {
    Shippable { origin: Address, destination: Address },
    Deposit { deposit_amount: i64 },
}

/// What `request_payment` resolved to.
#[derive(Debug, Clone)]
pub enum PaymentOutcome {
    /// Payment captured synchronously (wallet); order already advanced.
    Settled(Order),
    /// Gateway intent opened; the reconciler will settle it.
    AwaitingGateway {
        gateway_order_id: String,
        redirect_ref: String,
    },
    /// Settlement happens out of band (COD, manual bank transfer).
    AwaitingConfirmation,
}

/// Terminal outcome fed into `confirm_payment`.
#[derive(Debug, Clone)]
pub enum ConfirmOutcome {
    Success { transaction_id: Option<String> },
    Fail { reason: String },
}

/// The single authority for order status. Composes the wallet ledger,
/// the external adapters, the contract gate and the timeline; all
/// mutations to one order are serialized behind that order's mutex.
pub struct OrderStateMachine {
    catalog: Arc<dyn ProductCatalog>,
    carrier: Arc<dyn ShippingCarrier>,
    gateway: Arc<dyn PaymentGateway>,
    notifier: Arc<dyn Notifier>,
    wallet: Arc<WalletLedger>,
    timeline: Arc<OrderTimeline>,
    contracts: Arc<ContractCoordinator>,
    config: EngineConfig,
    orders: RwLock<HashMap<Uuid, Arc<Mutex<Order>>>>,
    intents: RwLock<HashMap<Uuid, PaymentIntent>>,
}

impl OrderStateMachine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        catalog: Arc<dyn ProductCatalog>,
        carrier: Arc<dyn ShippingCarrier>,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn Notifier>,
        wallet: Arc<WalletLedger>,
        timeline: Arc<OrderTimeline>,
        contracts: Arc<ContractCoordinator>,
        config: EngineConfig,
    ) -> Self {
        Self {
            catalog,
            carrier,
            gateway,
            notifier,
            wallet,
            timeline,
            contracts,
            config,
            orders: RwLock::new(HashMap::new()),
            intents: RwLock::new(HashMap::new()),
        }
    }

    pub fn wallet(&self) -> &WalletLedger {
        &self.wallet
    }

    pub fn timeline(&self) -> &OrderTimeline {
        &self.timeline
    }

    pub fn contracts(&self) -> &ContractCoordinator {
        &self.contracts
    }

    fn order_handle(&self, order_id: Uuid) -> Result<Arc<Mutex<Order>>, OrderError> {
        self.orders
            .read()
            .unwrap()
            .get(&order_id)
            .cloned()
            .ok_or(OrderError::NotFound(order_id))
    }

    pub async fn get_order(&self, order_id: Uuid) -> Result<Order, OrderError> {
        let handle = self.order_handle(order_id)?;
        let order = handle.lock().await;
        Ok(order.clone())
    }

    /// Validate the product, price the shipping leg, and persist a new
    /// order in `PENDING` / `DEPOSIT_PENDING`.
    pub async fn create_order(&self, req: CreateOrder) -> Result<Order, OrderError> {
        let product = self.catalog.get_product(req.product_id).await.map_err(|e| match e {
            CatalogError::NotFound(id) => OrderError::ProductUnavailable(format!("not found: {}", id)),
            CatalogError::Unavailable(msg) => OrderError::ProductUnavailable(msg),
        })?;
        if !product.available {
            return Err(OrderError::ProductUnavailable(format!(
                "already sold: {}",
                product.id
            )));
        }
        if req.quantity <= 0 {
            return Err(OrderError::InvalidAmount(format!(
                "quantity must be positive, got {}",
                req.quantity
            )));
        }
        if product.unit_price <= 0 {
            return Err(OrderError::InvalidAmount(format!(
                "product has non-positive price {}",
                product.unit_price
            )));
        }

        let mut order = match req.kind {
            NewOrderKind::Shippable { origin, destination } => {
                let subtotal = product
                    .unit_price
                    .checked_mul(req.quantity)
                    .ok_or_else(|| OrderError::InvalidAmount("order subtotal overflows".into()))?;
                let shipping_fee = self
                    .quote_shipping_fee(&product.category, &origin, &destination, &product, subtotal)
                    .await?;
                let commission = subtotal
                    .checked_mul(self.config.commission_rate_bps)
                    .map(|c| c / 10_000)
                    .ok_or_else(|| OrderError::InvalidAmount("commission overflows".into()))?;
                subtotal
                    .checked_add(shipping_fee)
                    .and_then(|v| v.checked_add(commission))
                    .ok_or_else(|| OrderError::InvalidAmount("order total overflows".into()))?;
                Order::new_shippable(
                    req.buyer_id,
                    product.seller_id,
                    product.id,
                    req.quantity,
                    product.unit_price,
                    shipping_fee,
                    commission,
                    req.method,
                    ShippingInfo::new(origin, destination),
                )
            }
            NewOrderKind::Deposit { deposit_amount } => {
                if deposit_amount <= 0 {
                    return Err(OrderError::InvalidAmount(format!(
                        "deposit must be positive, got {}",
                        deposit_amount
                    )));
                }
                Order::new_deposit(
                    req.buyer_id,
                    product.seller_id,
                    product.id,
                    deposit_amount,
                    req.method,
                )
            }
        };

        if let Some(template) = &product.contract_template {
            // Renderer outages are transient; the buyer retries the order.
            let contract = self
                .contracts
                .open(product.id, template)
                .await
                .map_err(|e| OrderError::RendererUnavailable(e.to_string()))?;
            order.contract = Some(crate::models::OrderContract {
                contract_id: contract.contract_id,
                document_ref: contract.document_ref,
                signed_at: contract.signed_at,
            });
        }

        self.timeline.append(
            order.id,
            None,
            order.status,
            Actor::User(order.buyer_id),
            format!("Order {} created", order.order_no),
        );
        tracing::info!(order_id = %order.id, order_no = %order.order_no, status = %order.status, "order created");

        self.orders
            .write()
            .unwrap()
            .insert(order.id, Arc::new(Mutex::new(order.clone())));

        self.notify(NotificationEvent::OrderCreated {
            order_id: order.id,
            order_no: order.order_no.to_string(),
            buyer_id: order.buyer_id,
            seller_id: order.seller_id,
        })
        .await;

        Ok(order)
    }

    async fn quote_shipping_fee(
        &self,
        category: &ProductCategory,
        origin: &Address,
        destination: &Address,
        product: &volt_core::Product,
        insured_value: i64,
    ) -> Result<i64, OrderError> {
        // Vehicles are priced flat; the carrier only quotes measured parcels.
        if *category == ProductCategory::Vehicle {
            return Ok(self.config.vehicle_flat_fee);
        }
        match timeout(
            self.config.external_timeout,
            self.carrier
                .quote(origin, destination, &product.parcel, insured_value),
        )
        .await
        {
            Ok(Ok(fee)) if fee > 0 => Ok(fee),
            Ok(Ok(fee)) => Err(OrderError::InvalidAmount(format!(
                "carrier returned non-positive fee {}",
                fee
            ))),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(OrderError::QuoteUnavailable("carrier quote timed out".into())),
        }
    }

    /// Capture payment for a pending order. Wallet debits settle
    /// synchronously; gateway payments open an intent and return the
    /// redirect reference for the buyer.
    pub async fn request_payment(&self, order_id: Uuid) -> Result<PaymentOutcome, OrderError> {
        let handle = self.order_handle(order_id)?;
        let mut order = handle.lock().await;

        // Retry after a crash: already settled means success, not error.
        if order.payment.status == PaymentStatus::Paid {
            return Ok(PaymentOutcome::Settled(order.clone()));
        }
        if !matches!(
            order.status,
            OrderStatus::Pending | OrderStatus::DepositPending
        ) {
            let to = self.success_target(&order);
            return Err(OrderError::InvalidTransition {
                from: order.status,
                to,
            });
        }

        if order.contract.is_some() && !self.contracts.is_satisfied(order.product_id) {
            return Err(OrderError::ContractNotSigned(order.product_id));
        }
        let contract_state = self.contracts.get(order.product_id);
        if let (Some(contract), Some(state)) = (order.contract.as_mut(), contract_state) {
            contract.signed_at = state.signed_at;
        }

        match order.payment.method {
            PaymentMethod::Wallet => {
                self.wallet
                    .debit(
                        order.buyer_id,
                        order.final_amount,
                        Some(order.id),
                        &format!("Payment for order {}", order.order_no),
                    )
                    .await?;
                self.settle_success(&mut order, None).await?;
                Ok(PaymentOutcome::Settled(order.clone()))
            }
            PaymentMethod::Gateway => {
                if let Some(intent) = self.intents.read().unwrap().get(&order.id) {
                    // Duplicate request: hand back the existing intent.
                    return Ok(PaymentOutcome::AwaitingGateway {
                        gateway_order_id: intent.gateway_order_id.clone(),
                        redirect_ref: intent.redirect_ref.clone(),
                    });
                }
                let intent = match timeout(
                    self.config.external_timeout,
                    self.gateway.create_intent(order.id, order.final_amount),
                )
                .await
                {
                    Ok(Ok(intent)) => intent,
                    Ok(Err(e)) => return Err(e.into()),
                    Err(_) => {
                        return Err(OrderError::GatewayUnavailable(
                            "gateway create-intent timed out".into(),
                        ))
                    }
                };
                let record = PaymentIntent {
                    gateway_order_id: intent.gateway_order_id.clone(),
                    order_id: order.id,
                    amount: intent.amount,
                    redirect_ref: intent.redirect_ref.clone(),
                    created_at: intent.created_at,
                    last_polled_at: None,
                };
                self.intents.write().unwrap().insert(order.id, record);
                tracing::info!(order_id = %order.id, gateway_order_id = %intent.gateway_order_id, "payment intent opened");
                Ok(PaymentOutcome::AwaitingGateway {
                    gateway_order_id: intent.gateway_order_id,
                    redirect_ref: intent.redirect_ref,
                })
            }
            PaymentMethod::Cod | PaymentMethod::BankTransfer => {
                // Settled out of band via confirm_payment by an admin.
                Ok(PaymentOutcome::AwaitingConfirmation)
            }
        }
    }

    fn success_target(&self, order: &Order) -> OrderStatus {
        match order.kind {
            OrderKind::Shippable { .. } => OrderStatus::Confirmed,
            OrderKind::Deposit { .. } => OrderStatus::DepositConfirmed,
        }
    }

    fn failure_target(&self, order: &Order) -> OrderStatus {
        match order.kind {
            OrderKind::Shippable { .. } => OrderStatus::Cancelled,
            OrderKind::Deposit { .. } => OrderStatus::DepositCancelled,
        }
    }

    /// Idempotent settlement entry point, invoked inline for wallet
    /// payments and by the reconciler (or an admin, for COD/bank
    /// transfer) for everything else. Re-invocation on a settled or
    /// terminal order is a no-op.
    pub async fn confirm_payment(
        &self,
        order_id: Uuid,
        outcome: ConfirmOutcome,
    ) -> Result<Order, OrderError> {
        let handle = self.order_handle(order_id)?;
        let mut order = handle.lock().await;

        if order.status.is_terminal() || order.payment.status.is_terminal() {
            // Duplicate poll or a late result racing a cancel. Never
            // resurrect; never double-apply.
            if let ConfirmOutcome::Success { transaction_id: Some(txn) } = &outcome {
                if order.payment.status == PaymentStatus::Paid
                    && order.payment.transaction_id.as_deref() != Some(txn.as_str())
                {
                    tracing::warn!(
                        order_id = %order.id,
                        %txn,
                        "confirm replayed with a different transaction id, ignoring"
                    );
                }
            }
            tracing::debug!(order_id = %order.id, status = %order.status, "confirm_payment no-op");
            return Ok(order.clone());
        }

        match outcome {
            ConfirmOutcome::Success { transaction_id } => {
                let target = self.success_target(&order);
                if !can_transition(order.status, target) {
                    return Err(OrderError::InvalidTransition {
                        from: order.status,
                        to: target,
                    });
                }
                self.wallet
                    .credit_pending(
                        order.seller_id,
                        order.final_amount,
                        Some(order.id),
                        &format!("Sale proceeds for order {}", order.order_no),
                    )
                    .await?;
                order.payment.status = PaymentStatus::Paid;
                order.payment.transaction_id = transaction_id;
                order.payment.paid_at = Some(Utc::now());
                self.transition(&mut order, target, Actor::System, "Payment confirmed")?;
                self.intents.write().unwrap().remove(&order.id);

                if let Err(e) = self.catalog.mark_sold(order.product_id).await {
                    tracing::warn!(order_id = %order.id, error = %e, "failed to mark product sold");
                }
                self.notify(NotificationEvent::PaymentConfirmed {
                    order_id: order.id,
                    order_no: order.order_no.to_string(),
                    amount: order.final_amount,
                })
                .await;
                Ok(order.clone())
            }
            ConfirmOutcome::Fail { reason } => {
                let target = self.failure_target(&order);
                if !can_transition(order.status, target) {
                    return Err(OrderError::InvalidTransition {
                        from: order.status,
                        to: target,
                    });
                }
                order.payment.status = PaymentStatus::Failed;
                self.transition(
                    &mut order,
                    target,
                    Actor::System,
                    &format!("Payment failed: {}", reason),
                )?;
                self.intents.write().unwrap().remove(&order.id);
                self.notify(NotificationEvent::PaymentFailed {
                    order_id: order.id,
                    order_no: order.order_no.to_string(),
                    reason,
                })
                .await;
                Ok(order.clone())
            }
        }
    }

    /// Settle a wallet payment already debited from the buyer. Runs
    /// under the caller's order lock.
    async fn settle_success(
        &self,
        order: &mut Order,
        transaction_id: Option<String>,
    ) -> Result<(), OrderError> {
        let target = self.success_target(order);
        self.wallet
            .credit_pending(
                order.seller_id,
                order.final_amount,
                Some(order.id),
                &format!("Sale proceeds for order {}", order.order_no),
            )
            .await?;
        order.payment.status = PaymentStatus::Paid;
        order.payment.transaction_id = transaction_id;
        order.payment.paid_at = Some(Utc::now());
        self.transition(order, target, Actor::System, "Payment confirmed via wallet")?;

        if let Err(e) = self.catalog.mark_sold(order.product_id).await {
            tracing::warn!(order_id = %order.id, error = %e, "failed to mark product sold");
        }
        self.notify(NotificationEvent::PaymentConfirmed {
            order_id: order.id,
            order_no: order.order_no.to_string(),
            amount: order.final_amount,
        })
        .await;
        Ok(())
    }

    /// Cancel a non-terminal, non-shipping order. Paid orders are
    /// refunded to the buyer and the seller escrow reversed before the
    /// status moves.
    pub async fn cancel(
        &self,
        order_id: Uuid,
        actor: Actor,
        reason: &str,
    ) -> Result<Order, OrderError> {
        let handle = self.order_handle(order_id)?;
        let mut order = handle.lock().await;

        // Repeat cancel resolves to the same end state.
        if matches!(
            order.status,
            OrderStatus::Cancelled
                | OrderStatus::Refunded
                | OrderStatus::DepositCancelled
                | OrderStatus::DepositRefunded
        ) {
            return Ok(order.clone());
        }

        let refunding = order.payment.status == PaymentStatus::Paid;
        let target = match (&order.kind, refunding) {
            (OrderKind::Shippable { .. }, true) => OrderStatus::Refunded,
            (OrderKind::Shippable { .. }, false) => OrderStatus::Cancelled,
            (OrderKind::Deposit { .. }, true) => OrderStatus::DepositRefunded,
            (OrderKind::Deposit { .. }, false) => OrderStatus::DepositCancelled,
        };
        if !can_transition(order.status, target) {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                to: target,
            });
        }

        if refunding {
            self.wallet
                .credit(
                    order.buyer_id,
                    order.final_amount,
                    Some(order.id),
                    &format!("Refund for order {}", order.order_no),
                )
                .await?;
            self.wallet
                .debit_pending(
                    order.seller_id,
                    order.final_amount,
                    Some(order.id),
                    &format!("Sale reversal for order {}", order.order_no),
                )
                .await
                .map_err(|e| OrderError::LedgerConflict(e.to_string()))?;
            order.payment.status = PaymentStatus::Refunded;
        }

        self.transition(
            &mut order,
            target,
            actor.clone(),
            &format!("Cancelled by {}: {}", actor, reason),
        )?;
        // Stop any in-flight polling for this order.
        self.intents.write().unwrap().remove(&order.id);

        self.notify(NotificationEvent::OrderCancelled {
            order_id: order.id,
            order_no: order.order_no.to_string(),
            refunded: refunding,
        })
        .await;
        Ok(order.clone())
    }

    /// Book the shipment on a confirmed shippable order.
    pub async fn advance_shipping(
        &self,
        order_id: Uuid,
        tracking_number: &str,
    ) -> Result<Order, OrderError> {
        let handle = self.order_handle(order_id)?;
        let mut order = handle.lock().await;
        if !order.kind.is_shippable() {
            return Err(OrderError::WrongKind);
        }
        if order.status == OrderStatus::Shipping {
            return Ok(order.clone());
        }
        if !can_transition(order.status, OrderStatus::Shipping) {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                to: OrderStatus::Shipping,
            });
        }
        let carrier_name = self.config.carrier_name.clone();
        if let Some(shipping) = order.shipping_mut() {
            shipping.tracking_number = Some(tracking_number.to_string());
            shipping.carrier_name = Some(carrier_name);
        }
        self.transition(
            &mut order,
            OrderStatus::Shipping,
            Actor::System,
            &format!("Shipment booked, tracking {}", tracking_number),
        )?;
        self.notify(NotificationEvent::ShipmentBooked {
            order_id: order.id,
            tracking_number: tracking_number.to_string(),
        })
        .await;
        Ok(order.clone())
    }

    /// Terminal happy path for shippable orders; releases the seller's
    /// escrowed proceeds.
    pub async fn mark_delivered(&self, order_id: Uuid) -> Result<Order, OrderError> {
        let handle = self.order_handle(order_id)?;
        let mut order = handle.lock().await;
        if !order.kind.is_shippable() {
            return Err(OrderError::WrongKind);
        }
        if order.status == OrderStatus::Delivered {
            return Ok(order.clone());
        }
        if !can_transition(order.status, OrderStatus::Delivered) {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                to: OrderStatus::Delivered,
            });
        }
        let now = Utc::now();
        if let Some(shipping) = order.shipping_mut() {
            shipping.delivered_at = Some(now);
        }
        self.wallet
            .release_pending(
                order.seller_id,
                order.final_amount,
                Some(order.id),
                &format!("Proceeds released for order {}", order.order_no),
            )
            .await
            .map_err(|e| OrderError::LedgerConflict(e.to_string()))?;
        self.transition(&mut order, OrderStatus::Delivered, Actor::System, "Delivered")?;
        self.notify(NotificationEvent::OrderDelivered { order_id: order.id })
            .await;
        Ok(order.clone())
    }

    /// Intents still awaiting an external result. Orders whose payment
    /// went terminal are removed at settlement time, so membership here
    /// is exactly the reconciler's work set.
    pub fn pending_gateway_intents(&self) -> Vec<PaymentIntent> {
        self.intents.read().unwrap().values().cloned().collect()
    }

    pub fn touch_intent(&self, order_id: Uuid) {
        if let Some(intent) = self.intents.write().unwrap().get_mut(&order_id) {
            intent.last_polled_at = Some(Utc::now());
        }
    }

    pub(crate) async fn apply_meeting_update(
        &self,
        order_id: Uuid,
        admin_id: Uuid,
        patch: MeetingPatch,
    ) -> Result<Meeting, MeetingError> {
        let handle = self
            .order_handle(order_id)
            .map_err(|_| MeetingError::OrderNotFound(order_id))?;
        let mut order = handle.lock().await;

        if order.kind.is_shippable() {
            return Err(MeetingError::WrongKind);
        }
        if order.status != OrderStatus::DepositConfirmed {
            return Err(MeetingError::NotSchedulable(order.status));
        }

        let updated = {
            let OrderKind::Deposit { meeting } = &mut order.kind else {
                return Err(MeetingError::WrongKind);
            };
            let mut m = meeting.clone().unwrap_or_else(Meeting::suggestion);
            if patch.time.is_some() {
                m.time = patch.time;
            }
            if patch.location.is_some() {
                m.location = patch.location;
            }
            if patch.address.is_some() {
                m.address = patch.address;
            }
            m.is_suggestion = false;
            m.updated_by = Some(admin_id);
            m.updated_at = Utc::now();
            *meeting = Some(m.clone());
            m
        };
        order.updated_at = updated.updated_at;

        self.timeline.append(
            order.id,
            Some(order.status),
            order.status,
            Actor::Admin(admin_id),
            "Meeting details updated",
        );
        self.notify(NotificationEvent::MeetingScheduled {
            order_id: order.id,
            updated_by: admin_id,
        })
        .await;
        Ok(updated)
    }

    fn transition(
        &self,
        order: &mut Order,
        to: OrderStatus,
        actor: Actor,
        description: &str,
    ) -> Result<(), OrderError> {
        let from = order.status;
        if !can_transition(from, to) {
            return Err(OrderError::InvalidTransition { from, to });
        }
        order.update_status(to);
        self.timeline
            .append(order.id, Some(from), to, actor, description);
        tracing::info!(order_id = %order.id, %from, %to, "order transitioned");
        Ok(())
    }

    /// Fire-and-forget: a failing notifier never rolls back a transition.
    async fn notify(&self, event: NotificationEvent) {
        if let Err(e) = self.notifier.notify(event).await {
            tracing::warn!(error = %e, "notification dispatch failed");
        }
    }
}
