use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(PaymentStatus::Pending),
            "PAID" => Some(PaymentStatus::Paid),
            "FAILED" => Some(PaymentStatus::Failed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PROCESSING" => Some(OrderStatus::Processing),
            "SHIPPED" => Some(OrderStatus::Shipped),
            "DELIVERED" => Some(OrderStatus::Delivered),
            "CANCELLED" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }
}

/// One requested line of a checkout, as submitted by the client.
#[derive(Debug, Clone)]
pub struct CheckoutLine {
    pub product_id: Uuid,
    pub size: String,
    pub quantity: i32,
}

/// A checkout line after the catalog lookup fixed its unit price.
#[derive(Debug, Clone)]
pub struct PricedLine {
    pub product_id: Uuid,
    pub size: String,
    pub quantity: i32,
    pub unit_price: BigDecimal,
}

/// A fully priced order, ready to be persisted in one transaction.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub lines: Vec<PricedLine>,
    pub total_amount: BigDecimal,
    pub shipping_address: Option<String>,
    pub phone: Option<String>,
}

/// How the order is being paid, decided before the transaction opens.
#[derive(Debug, Clone)]
pub enum PaymentDetails {
    CashOnDelivery,
    GatewayVerified {
        gateway_order_id: String,
        gateway_payment_id: String,
        gateway_signature: String,
    },
}

/// The slice of the catalog the checkout needs: current price per product.
#[derive(Debug, Clone)]
pub struct ProductInfo {
    pub id: Uuid,
    pub name: String,
    pub price: BigDecimal,
}

#[derive(Debug, Clone)]
pub struct OrderItemView {
    pub id: Uuid,
    pub product_id: Uuid,
    pub size: String,
    pub quantity: i32,
    pub price: BigDecimal,
}

#[derive(Debug, Clone)]
pub struct OrderView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub total_amount: BigDecimal,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatus,
    pub gateway_order_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    pub shipping_address: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItemView>,
}

/// Result of an order-status update: the persisted order plus the observed
/// previous/current pair, so the caller can decide whether to fan out.
#[derive(Debug, Clone)]
pub struct StatusTransition {
    pub order: OrderView,
    pub previous: OrderStatus,
    pub current: OrderStatus,
}

impl StatusTransition {
    pub fn changed(&self) -> bool {
        self.previous != self.current
    }
}

/// Inbox/push message for an order-status transition.
pub fn status_message(order_id: Uuid, status: OrderStatus) -> String {
    format!("Your order #{} was {}.", order_id, status.as_str())
}

#[derive(Debug, Clone)]
pub struct NotificationView {
    pub id: Uuid,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_status_roundtrips_through_strings() {
        for status in [
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(OrderStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(OrderStatus::parse("UNKNOWN"), None);
    }

    #[test]
    fn payment_status_roundtrips_through_strings() {
        for status in [
            PaymentStatus::Pending,
            PaymentStatus::Paid,
            PaymentStatus::Failed,
        ] {
            assert_eq!(PaymentStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(PaymentStatus::parse("paid"), None);
    }
}
