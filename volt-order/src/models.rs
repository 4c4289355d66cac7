use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use volt_core::shipping::Address;
use volt_shared::OrderNo;

use crate::meeting::Meeting;

/// Order status in the lifecycle. Closed set; every legal edge is
/// enumerated in `statemachine::can_transition`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipping,
    Delivered,
    Cancelled,
    Refunded,
    DepositPending,
    DepositConfirmed,
    DepositCancelled,
    DepositRefunded,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Delivered
                | OrderStatus::Cancelled
                | OrderStatus::Refunded
                | OrderStatus::DepositCancelled
                | OrderStatus::DepositRefunded
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Shipping => "SHIPPING",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Refunded => "REFUNDED",
            OrderStatus::DepositPending => "DEPOSIT_PENDING",
            OrderStatus::DepositConfirmed => "DEPOSIT_CONFIRMED",
            OrderStatus::DepositCancelled => "DEPOSIT_CANCELLED",
            OrderStatus::DepositRefunded => "DEPOSIT_REFUNDED",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Wallet,
    Gateway,
    Cod,
    BankTransfer,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
    Failed,
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl Payment {
    pub fn pending(method: PaymentMethod) -> Self {
        Self {
            method,
            status: PaymentStatus::Pending,
            transaction_id: None,
            paid_at: None,
        }
    }
}

/// Carrier-side data for a shippable order. Tracking number stays empty
/// until the shipment is booked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingInfo {
    pub origin: Address,
    pub destination: Address,
    pub carrier_name: Option<String>,
    pub tracking_number: Option<String>,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
}

impl ShippingInfo {
    pub fn new(origin: Address, destination: Address) -> Self {
        Self {
            origin,
            destination,
            carrier_name: None,
            tracking_number: None,
            estimated_delivery: None,
            delivered_at: None,
        }
    }
}

/// Contract attachment on an order. Signature state lives in the
/// ContractCoordinator; the order keeps the reference and the moment
/// both parties had signed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderContract {
    pub contract_id: Uuid,
    pub document_ref: Option<String>,
    pub signed_at: Option<DateTime<Utc>>,
}

/// What kind of transaction this order is. Fixed at creation; each kind
/// carries only the fields that exist for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", tag = "kind")]
pub enum OrderKind {
    Shippable { shipping: ShippingInfo },
    Deposit { meeting: Option<Meeting> },
}

impl OrderKind {
    pub fn is_shippable(&self) -> bool {
        matches!(self, OrderKind::Shippable { .. })
    }
}

/// The central aggregate. Mutated only through the OrderStateMachine,
/// one writer per order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub order_no: OrderNo,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i64,
    pub unit_price: i64,
    pub shipping_fee: i64,
    pub commission: i64,
    pub final_amount: i64,
    pub status: OrderStatus,
    pub payment: Payment,
    pub kind: OrderKind,
    pub contract: Option<OrderContract>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn new_shippable(
        buyer_id: Uuid,
        seller_id: Uuid,
        product_id: Uuid,
        quantity: i64,
        unit_price: i64,
        shipping_fee: i64,
        commission: i64,
        method: PaymentMethod,
        shipping: ShippingInfo,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            order_no: OrderNo::generate(),
            buyer_id,
            seller_id,
            product_id,
            quantity,
            unit_price,
            shipping_fee,
            commission,
            final_amount: unit_price * quantity + shipping_fee + commission,
            status: OrderStatus::Pending,
            payment: Payment::pending(method),
            kind: OrderKind::Shippable { shipping },
            contract: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Deposit orders carry the deposit amount only; shipping and
    /// commission are zero.
    pub fn new_deposit(
        buyer_id: Uuid,
        seller_id: Uuid,
        product_id: Uuid,
        deposit_amount: i64,
        method: PaymentMethod,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            order_no: OrderNo::generate(),
            buyer_id,
            seller_id,
            product_id,
            quantity: 1,
            unit_price: deposit_amount,
            shipping_fee: 0,
            commission: 0,
            final_amount: deposit_amount,
            status: OrderStatus::DepositPending,
            payment: Payment::pending(method),
            kind: OrderKind::Deposit { meeting: None },
            contract: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn update_status(&mut self, new_status: OrderStatus) {
        self.status = new_status;
        self.updated_at = Utc::now();
    }

    pub fn shipping(&self) -> Option<&ShippingInfo> {
        match &self.kind {
            OrderKind::Shippable { shipping } => Some(shipping),
            OrderKind::Deposit { .. } => None,
        }
    }

    pub fn shipping_mut(&mut self) -> Option<&mut ShippingInfo> {
        match &mut self.kind {
            OrderKind::Shippable { shipping } => Some(shipping),
            OrderKind::Deposit { .. } => None,
        }
    }

    pub fn meeting(&self) -> Option<&Meeting> {
        match &self.kind {
            OrderKind::Deposit { meeting } => meeting.as_ref(),
            OrderKind::Shippable { .. } => None,
        }
    }
}

/// Engine-side record of an in-flight external payment. Discarded once
/// the gateway reports a terminal status; its effect survives in
/// Order.payment and the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub gateway_order_id: String,
    pub order_id: Uuid,
    pub amount: i64,
    pub redirect_ref: String,
    pub created_at: DateTime<Utc>,
    pub last_polled_at: Option<DateTime<Utc>>,
}
