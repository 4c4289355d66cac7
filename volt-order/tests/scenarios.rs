use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use volt_core::catalog::{InMemoryCatalog, Product, ProductCategory};
use volt_core::notify::RecordingNotifier;
use volt_core::payment::{GatewayStatus, MockGateway};
use volt_core::renderer::{FailingRenderer, StubRenderer};
use volt_core::shipping::{Address, MockCarrier, Parcel};
use volt_order::contract::ContractParty;
use volt_order::meeting::{MeetingPatch, MeetingScheduler};
use volt_order::models::{OrderStatus, PaymentMethod, PaymentStatus};
use volt_order::reconciler::PaymentReconciler;
use volt_order::statemachine::{
    ConfirmOutcome, CreateOrder, EngineConfig, NewOrderKind, OrderError, OrderStateMachine,
    PaymentOutcome,
};
use volt_order::timeline::OrderTimeline;
use volt_order::wallet::WalletLedger;
use volt_order::ContractCoordinator;
use volt_shared::Actor;

struct Harness {
    engine: Arc<OrderStateMachine>,
    catalog: Arc<InMemoryCatalog>,
    carrier: Arc<MockCarrier>,
    gateway: Arc<MockGateway>,
    reconciler: PaymentReconciler,
}

fn harness() -> Harness {
    let catalog = Arc::new(InMemoryCatalog::new());
    let carrier = Arc::new(MockCarrier::new(15_000, 6_000));
    let gateway = Arc::new(MockGateway::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let wallet = Arc::new(WalletLedger::new());
    let timeline = Arc::new(OrderTimeline::new());
    let contracts = Arc::new(ContractCoordinator::new(Arc::new(StubRenderer)));

    let engine = Arc::new(OrderStateMachine::new(
        catalog.clone(),
        carrier.clone(),
        gateway.clone(),
        notifier,
        wallet,
        timeline,
        contracts,
        EngineConfig {
            commission_rate_bps: 0,
            vehicle_flat_fee: 300_000,
            carrier_name: "GHN".to_string(),
            external_timeout: Duration::from_secs(2),
        },
    ));
    let reconciler = PaymentReconciler::new(engine.clone(), gateway.clone(), Duration::from_secs(2));
    Harness {
        engine,
        catalog,
        carrier,
        gateway,
        reconciler,
    }
}

fn address(street: &str) -> Address {
    Address {
        district_code: Some(1454),
        ward_code: Some("21211".into()),
        street: street.into(),
    }
}

fn battery(seller_id: Uuid) -> Product {
    Product {
        id: Uuid::new_v4(),
        seller_id,
        name: "Used 60kWh pack".into(),
        unit_price: 5_000_000,
        category: ProductCategory::Battery,
        parcel: Parcel {
            weight_grams: 5_000,
            length_cm: 40,
            width_cm: 30,
            height_cm: 25,
        },
        contract_template: None,
        available: true,
    }
}

fn vehicle(seller_id: Uuid, template: Option<&str>) -> Product {
    Product {
        id: Uuid::new_v4(),
        seller_id,
        name: "2021 e-scooter".into(),
        unit_price: 18_000_000,
        category: ProductCategory::Vehicle,
        parcel: Parcel {
            weight_grams: 90_000,
            length_cm: 180,
            width_cm: 70,
            height_cm: 110,
        },
        contract_template: template.map(|t| t.to_string()),
        available: true,
    }
}

fn shippable(buyer: Uuid, product: &Product, method: PaymentMethod) -> CreateOrder {
    CreateOrder {
        buyer_id: buyer,
        product_id: product.id,
        quantity: 1,
        kind: NewOrderKind::Shippable {
            origin: address("12 Nguyen Hue"),
            destination: address("5 Le Loi"),
        },
        method,
    }
}

#[tokio::test]
async fn scenario_wallet_checkout_debits_and_confirms() {
    let h = harness();
    let buyer = Uuid::new_v4();
    let seller = Uuid::new_v4();
    let product = battery(seller);
    h.catalog.insert(product.clone());
    h.engine.wallet().credit(buyer, 6_000_000, None, "top-up").await.unwrap();

    let order = h.engine.create_order(shippable(buyer, &product, PaymentMethod::Wallet)).await.unwrap();
    assert_eq!(order.shipping_fee, 45_000);
    assert_eq!(order.final_amount, 5_045_000);

    let outcome = h.engine.request_payment(order.id).await.unwrap();
    let settled = match outcome {
        PaymentOutcome::Settled(o) => o,
        other => panic!("expected settled, got {:?}", other),
    };
    assert_eq!(settled.status, OrderStatus::Confirmed);
    assert_eq!(settled.payment.status, PaymentStatus::Paid);
    assert_eq!(h.engine.wallet().balance_of(buyer).await, 955_000);

    let debits: Vec<_> = h
        .engine
        .wallet()
        .entries_for(buyer)
        .await
        .into_iter()
        .filter(|e| e.order_id == Some(order.id))
        .collect();
    assert_eq!(debits.len(), 1);
    assert_eq!(debits[0].delta, -5_045_000);

    // Last timeline entry matches the current status.
    let timeline = h.engine.timeline().list_for(order.id);
    assert_eq!(timeline.last().unwrap().to_status, OrderStatus::Confirmed);
    assert!(timeline.windows(2).all(|w| w[0].at <= w[1].at));
}

#[tokio::test]
async fn scenario_insufficient_funds_leaves_order_pending() {
    let h = harness();
    let buyer = Uuid::new_v4();
    let product = battery(Uuid::new_v4());
    h.catalog.insert(product.clone());
    h.engine.wallet().credit(buyer, 1_000_000, None, "top-up").await.unwrap();

    let order = h.engine.create_order(shippable(buyer, &product, PaymentMethod::Wallet)).await.unwrap();
    let err = h.engine.request_payment(order.id).await.unwrap_err();
    assert!(matches!(
        err,
        OrderError::InsufficientFunds {
            needed: 5_045_000,
            available: 1_000_000
        }
    ));

    let order = h.engine.get_order(order.id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(h.engine.wallet().balance_of(buyer).await, 1_000_000);
    let order_entries: Vec<_> = h
        .engine
        .wallet()
        .entries_for(buyer)
        .await
        .into_iter()
        .filter(|e| e.order_id == Some(order.id))
        .collect();
    assert!(order_entries.is_empty());
}

#[tokio::test]
async fn scenario_deposit_gateway_settles_once_even_with_duplicate_polls() {
    let h = harness();
    let buyer = Uuid::new_v4();
    let seller = Uuid::new_v4();
    let product = vehicle(seller, None);
    h.catalog.insert(product.clone());

    let order = h
        .engine
        .create_order(CreateOrder {
            buyer_id: buyer,
            product_id: product.id,
            quantity: 1,
            kind: NewOrderKind::Deposit {
                deposit_amount: 2_000_000,
            },
            method: PaymentMethod::Gateway,
        })
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::DepositPending);

    let gateway_order_id = match h.engine.request_payment(order.id).await.unwrap() {
        PaymentOutcome::AwaitingGateway { gateway_order_id, .. } => gateway_order_id,
        other => panic!("expected awaiting gateway, got {:?}", other),
    };
    assert_eq!(
        h.engine.get_order(order.id).await.unwrap().status,
        OrderStatus::DepositPending
    );

    h.gateway.resolve(&gateway_order_id, GatewayStatus::Success);
    let stats = h.reconciler.sweep_once().await;
    assert_eq!(stats.settled, 1);

    let order_after = h.engine.get_order(order.id).await.unwrap();
    assert_eq!(order_after.status, OrderStatus::DepositConfirmed);
    assert_eq!(order_after.payment.status, PaymentStatus::Paid);
    assert_eq!(h.engine.wallet().pending_of(seller).await, 2_000_000);

    // A late duplicate confirmation leaves order and ledger unchanged.
    h.engine
        .confirm_payment(
            order.id,
            ConfirmOutcome::Success {
                transaction_id: Some(gateway_order_id.clone()),
            },
        )
        .await
        .unwrap();
    assert_eq!(h.engine.wallet().pending_of(seller).await, 2_000_000);
    assert_eq!(h.engine.wallet().entries_for(seller).await.len(), 1);

    // The intent left the sweep set at settlement.
    let stats = h.reconciler.sweep_once().await;
    assert_eq!(stats.polled, 0);
}

#[tokio::test]
async fn scenario_meeting_schedule_and_partial_reschedule() {
    let h = harness();
    let buyer = Uuid::new_v4();
    let product = vehicle(Uuid::new_v4(), None);
    h.catalog.insert(product.clone());
    h.engine.wallet().credit(buyer, 3_000_000, None, "top-up").await.unwrap();

    let order = h
        .engine
        .create_order(CreateOrder {
            buyer_id: buyer,
            product_id: product.id,
            quantity: 1,
            kind: NewOrderKind::Deposit {
                deposit_amount: 2_000_000,
            },
            method: PaymentMethod::Wallet,
        })
        .await
        .unwrap();
    h.engine.request_payment(order.id).await.unwrap();

    let scheduler = MeetingScheduler::new(h.engine.clone());
    let admin = Uuid::new_v4();
    let time = "2025-02-01T10:00:00Z".parse().unwrap();

    let meeting = scheduler
        .schedule(
            order.id,
            admin,
            MeetingPatch {
                time: Some(time),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(meeting.time, Some(time));
    assert!(!meeting.is_suggestion);
    assert_eq!(meeting.updated_by, Some(admin));

    // Reschedule overwrites location, preserves time.
    let meeting = scheduler
        .schedule(
            order.id,
            admin,
            MeetingPatch {
                location: Some("Showroom A".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(meeting.time, Some(time));
    assert_eq!(meeting.location.as_deref(), Some("Showroom A"));

    let err = scheduler.schedule(order.id, admin, MeetingPatch::default()).await;
    assert!(err.is_err());

    // Two timeline entries beyond creation and confirmation.
    let timeline = h.engine.timeline().list_for(order.id);
    assert_eq!(timeline.len(), 4);
}

#[tokio::test]
async fn scenario_cancel_while_shipping_is_rejected() {
    let h = harness();
    let buyer = Uuid::new_v4();
    let product = battery(Uuid::new_v4());
    h.catalog.insert(product.clone());
    h.engine.wallet().credit(buyer, 6_000_000, None, "top-up").await.unwrap();

    let order = h.engine.create_order(shippable(buyer, &product, PaymentMethod::Wallet)).await.unwrap();
    h.engine.request_payment(order.id).await.unwrap();
    h.engine.advance_shipping(order.id, "GHN123456").await.unwrap();

    let err = h
        .engine
        .cancel(order.id, Actor::User(buyer), "changed my mind")
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::InvalidTransition { from: OrderStatus::Shipping, .. }));
    assert_eq!(
        h.engine.get_order(order.id).await.unwrap().status,
        OrderStatus::Shipping
    );
}

#[tokio::test]
async fn scenario_cancel_paid_order_refunds_buyer() {
    let h = harness();
    let buyer = Uuid::new_v4();
    let seller = Uuid::new_v4();
    let product = battery(seller);
    h.catalog.insert(product.clone());
    h.engine.wallet().credit(buyer, 6_000_000, None, "top-up").await.unwrap();

    let order = h.engine.create_order(shippable(buyer, &product, PaymentMethod::Wallet)).await.unwrap();
    h.engine.request_payment(order.id).await.unwrap();
    assert_eq!(h.engine.wallet().balance_of(buyer).await, 955_000);

    let admin = Uuid::new_v4();
    let cancelled = h
        .engine
        .cancel(order.id, Actor::Admin(admin), "listing withdrawn")
        .await
        .unwrap();
    assert_eq!(cancelled.status, OrderStatus::Refunded);
    assert_eq!(cancelled.payment.status, PaymentStatus::Refunded);
    assert_eq!(h.engine.wallet().balance_of(buyer).await, 6_000_000);
    assert_eq!(h.engine.wallet().pending_of(seller).await, 0);

    // Both ledgers still reconcile after the refund.
    assert!(h.engine.wallet().audit(buyer).await);
    assert!(h.engine.wallet().audit(seller).await);
}

#[tokio::test]
async fn retrying_request_payment_never_double_debits() {
    let h = harness();
    let buyer = Uuid::new_v4();
    let product = battery(Uuid::new_v4());
    h.catalog.insert(product.clone());
    h.engine.wallet().credit(buyer, 11_000_000, None, "top-up").await.unwrap();

    let order = h.engine.create_order(shippable(buyer, &product, PaymentMethod::Wallet)).await.unwrap();
    h.engine.request_payment(order.id).await.unwrap();
    // The retry resolves to the same state without a second debit.
    let retry = h.engine.request_payment(order.id).await.unwrap();
    assert!(matches!(retry, PaymentOutcome::Settled(_)));
    assert_eq!(h.engine.wallet().balance_of(buyer).await, 5_955_000);
}

#[tokio::test]
async fn contract_gate_blocks_payment_until_both_signatures() {
    let h = harness();
    let buyer = Uuid::new_v4();
    let seller = Uuid::new_v4();
    let product = vehicle(seller, Some("ev-sale-v1"));
    h.catalog.insert(product.clone());
    h.engine.wallet().credit(buyer, 20_000_000, None, "top-up").await.unwrap();

    let order = h.engine.create_order(shippable(buyer, &product, PaymentMethod::Wallet)).await.unwrap();
    assert!(order.contract.is_some());

    // Fails until both parties have signed, never afterwards.
    let err = h.engine.request_payment(order.id).await.unwrap_err();
    assert!(matches!(err, OrderError::ContractNotSigned(_)));

    h.engine
        .contracts()
        .attach_signature(product.id, ContractParty::Seller, seller, "sig/seller.png")
        .unwrap();
    let err = h.engine.request_payment(order.id).await.unwrap_err();
    assert!(matches!(err, OrderError::ContractNotSigned(_)));

    h.engine
        .contracts()
        .attach_signature(product.id, ContractParty::Buyer, buyer, "sig/buyer.png")
        .unwrap();
    let outcome = h.engine.request_payment(order.id).await.unwrap();
    assert!(matches!(outcome, PaymentOutcome::Settled(_)));
}

#[tokio::test]
async fn transport_errors_never_fail_an_order() {
    let h = harness();
    let buyer = Uuid::new_v4();
    let product = vehicle(Uuid::new_v4(), None);
    h.catalog.insert(product.clone());

    let order = h
        .engine
        .create_order(CreateOrder {
            buyer_id: buyer,
            product_id: product.id,
            quantity: 1,
            kind: NewOrderKind::Deposit {
                deposit_amount: 2_000_000,
            },
            method: PaymentMethod::Gateway,
        })
        .await
        .unwrap();
    let gateway_order_id = match h.engine.request_payment(order.id).await.unwrap() {
        PaymentOutcome::AwaitingGateway { gateway_order_id, .. } => gateway_order_id,
        other => panic!("unexpected {:?}", other),
    };

    h.gateway.set_unavailable(true);
    let stats = h.reconciler.sweep_once().await;
    assert_eq!(stats.transport_errors, 1);
    assert_eq!(
        h.engine.get_order(order.id).await.unwrap().status,
        OrderStatus::DepositPending
    );

    h.gateway.set_unavailable(false);
    h.gateway.resolve(&gateway_order_id, GatewayStatus::Success);
    let stats = h.reconciler.sweep_once().await;
    assert_eq!(stats.settled, 1);
}

#[tokio::test]
async fn cancelling_an_in_flight_gateway_order_stops_polling() {
    let h = harness();
    let buyer = Uuid::new_v4();
    let product = vehicle(Uuid::new_v4(), None);
    h.catalog.insert(product.clone());

    let order = h
        .engine
        .create_order(CreateOrder {
            buyer_id: buyer,
            product_id: product.id,
            quantity: 1,
            kind: NewOrderKind::Deposit {
                deposit_amount: 2_000_000,
            },
            method: PaymentMethod::Gateway,
        })
        .await
        .unwrap();
    let gateway_order_id = match h.engine.request_payment(order.id).await.unwrap() {
        PaymentOutcome::AwaitingGateway { gateway_order_id, .. } => gateway_order_id,
        other => panic!("unexpected {:?}", other),
    };

    h.engine
        .cancel(order.id, Actor::User(buyer), "buyer backed out")
        .await
        .unwrap();

    // A late success from the gateway must not resurrect the order.
    h.gateway.resolve(&gateway_order_id, GatewayStatus::Success);
    let stats = h.reconciler.sweep_once().await;
    assert_eq!(stats.polled, 0);
    assert_eq!(
        h.engine.get_order(order.id).await.unwrap().status,
        OrderStatus::DepositCancelled
    );
}

#[tokio::test]
async fn gateway_fail_status_cancels_the_order() {
    let h = harness();
    let buyer = Uuid::new_v4();
    let seller = Uuid::new_v4();
    let product = battery(seller);
    h.catalog.insert(product.clone());

    let order = h.engine.create_order(shippable(buyer, &product, PaymentMethod::Gateway)).await.unwrap();
    let gateway_order_id = match h.engine.request_payment(order.id).await.unwrap() {
        PaymentOutcome::AwaitingGateway { gateway_order_id, .. } => gateway_order_id,
        other => panic!("unexpected {:?}", other),
    };

    h.gateway.resolve(&gateway_order_id, GatewayStatus::Fail);
    let stats = h.reconciler.sweep_once().await;
    assert_eq!(stats.failed, 1);

    let order = h.engine.get_order(order.id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);
    assert_eq!(order.payment.status, PaymentStatus::Failed);
    // No ledger effect on an explicit failure.
    assert!(h.engine.wallet().entries_for(seller).await.is_empty());
}

#[tokio::test]
async fn renderer_outage_blocks_creation_as_retryable() {
    let catalog = Arc::new(InMemoryCatalog::new());
    let engine = Arc::new(OrderStateMachine::new(
        catalog.clone(),
        Arc::new(MockCarrier::new(15_000, 6_000)),
        Arc::new(MockGateway::new()),
        Arc::new(RecordingNotifier::new()),
        Arc::new(WalletLedger::new()),
        Arc::new(OrderTimeline::new()),
        Arc::new(ContractCoordinator::new(Arc::new(FailingRenderer))),
        EngineConfig::default(),
    ));
    let buyer = Uuid::new_v4();
    let product = vehicle(Uuid::new_v4(), Some("ev-sale-v1"));
    catalog.insert(product.clone());

    let err = engine
        .create_order(shippable(buyer, &product, PaymentMethod::Wallet))
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::RendererUnavailable(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn amounts_that_overflow_are_rejected() {
    let h = harness();
    let buyer = Uuid::new_v4();

    let mut product = battery(Uuid::new_v4());
    product.unit_price = i64::MAX / 2;
    h.catalog.insert(product.clone());
    let mut req = shippable(buyer, &product, PaymentMethod::Wallet);
    req.quantity = 3;
    let err = h.engine.create_order(req).await.unwrap_err();
    assert!(matches!(err, OrderError::InvalidAmount(_)));

    // Survives the subtotal but not the final total once the fee lands.
    let mut product = battery(Uuid::new_v4());
    product.unit_price = i64::MAX;
    h.catalog.insert(product.clone());
    let err = h
        .engine
        .create_order(shippable(buyer, &product, PaymentMethod::Wallet))
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::InvalidAmount(_)));
}

#[tokio::test]
async fn quote_unavailable_fails_order_creation_fast() {
    let h = harness();
    let buyer = Uuid::new_v4();
    let product = battery(Uuid::new_v4());
    h.catalog.insert(product.clone());
    h.carrier.set_unavailable(true);

    let err = h
        .engine
        .create_order(shippable(buyer, &product, PaymentMethod::Wallet))
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::QuoteUnavailable(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn delivery_releases_seller_escrow() {
    let h = harness();
    let buyer = Uuid::new_v4();
    let seller = Uuid::new_v4();
    let product = battery(seller);
    h.catalog.insert(product.clone());
    h.engine.wallet().credit(buyer, 6_000_000, None, "top-up").await.unwrap();

    let order = h.engine.create_order(shippable(buyer, &product, PaymentMethod::Wallet)).await.unwrap();
    h.engine.request_payment(order.id).await.unwrap();
    assert_eq!(h.engine.wallet().pending_of(seller).await, 5_045_000);

    h.engine.advance_shipping(order.id, "GHN123456").await.unwrap();
    let delivered = h.engine.mark_delivered(order.id).await.unwrap();
    assert_eq!(delivered.status, OrderStatus::Delivered);
    assert_eq!(h.engine.wallet().pending_of(seller).await, 0);
    assert_eq!(h.engine.wallet().balance_of(seller).await, 5_045_000);
    assert!(h.engine.wallet().audit(seller).await);

    // Nothing moves out of a terminal state.
    let err = h
        .engine
        .cancel(order.id, Actor::System, "too late")
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::InvalidTransition { .. }));
}

#[tokio::test]
async fn shipping_requires_confirmed_status() {
    let h = harness();
    let buyer = Uuid::new_v4();
    let product = battery(Uuid::new_v4());
    h.catalog.insert(product.clone());

    let order = h.engine.create_order(shippable(buyer, &product, PaymentMethod::Wallet)).await.unwrap();
    let err = h.engine.advance_shipping(order.id, "GHN1").await.unwrap_err();
    assert!(matches!(
        err,
        OrderError::InvalidTransition {
            from: OrderStatus::Pending,
            to: OrderStatus::Shipping
        }
    ));
    let err = h.engine.mark_delivered(order.id).await.unwrap_err();
    assert!(matches!(err, OrderError::InvalidTransition { .. }));
}
