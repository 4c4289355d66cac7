use uuid::Uuid;

/// Events handed to the notification collaborator. Delivery mechanics
/// (email, push) live outside this workspace; failures never roll back
/// the transition that produced the event.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", tag = "type")]
pub enum NotificationEvent {
    OrderCreated {
        order_id: Uuid,
        order_no: String,
        buyer_id: Uuid,
        seller_id: Uuid,
    },
    PaymentConfirmed {
        order_id: Uuid,
        order_no: String,
        amount: i64,
    },
    PaymentFailed {
        order_id: Uuid,
        order_no: String,
        reason: String,
    },
    OrderCancelled {
        order_id: Uuid,
        order_no: String,
        refunded: bool,
    },
    ShipmentBooked {
        order_id: Uuid,
        tracking_number: String,
    },
    OrderDelivered {
        order_id: Uuid,
    },
    MeetingScheduled {
        order_id: Uuid,
        updated_by: Uuid,
    },
}
