use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use super::errors::CheckoutError;
use super::order::{
    NotificationView, OrderDraft, OrderStatus, OrderView, PaymentDetails, ProductInfo,
    StatusTransition,
};

/// Storage port for the checkout workflow.
///
/// `create_order` and `update_order_status` are transactional: either every
/// write they describe lands, or none do.
pub trait CheckoutStore: Send + Sync + 'static {
    /// Batch catalog lookup. Ids missing from the result were not found.
    fn load_products(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, ProductInfo>, CheckoutError>;

    /// Reserve stock for every line, persist the order with its items, and
    /// clear the purchased cart rows, all in one transaction.
    fn create_order(
        &self,
        user_id: Uuid,
        draft: OrderDraft,
        payment: PaymentDetails,
    ) -> Result<OrderView, CheckoutError>;

    fn list_orders(&self, user_id: Uuid) -> Result<Vec<OrderView>, CheckoutError>;

    fn find_order(&self, user_id: Uuid, order_id: Uuid)
        -> Result<Option<OrderView>, CheckoutError>;

    /// Owner-scoped shipping-address update. Does not touch `order_status`.
    fn update_shipping_address(
        &self,
        user_id: Uuid,
        order_id: Uuid,
        address: &str,
    ) -> Result<OrderView, CheckoutError>;

    /// Set `order_status`, writing the inbox notification in the same
    /// transaction when the value actually changes.
    fn update_order_status(
        &self,
        order_id: Uuid,
        status: OrderStatus,
    ) -> Result<StatusTransition, CheckoutError>;

    fn list_notifications(&self, user_id: Uuid) -> Result<Vec<NotificationView>, CheckoutError>;

    /// Mark one notification (by id) or all of the user's notifications as
    /// read. Returns the number of rows touched.
    fn mark_notifications_read(
        &self,
        user_id: Uuid,
        notification_id: Option<Uuid>,
    ) -> Result<usize, CheckoutError>;
}

/// Outbound call to the payment gateway's order-creation API.
#[async_trait]
pub trait RemoteGateway: Send + Sync + 'static {
    /// Register an order with the gateway; returns the gateway's order id.
    /// `amount_minor` is in minor currency units (e.g. paise).
    async fn create_order(&self, amount_minor: i64, currency: &str)
        -> Result<String, CheckoutError>;
}

/// Best-effort live delivery to a user's connected sessions. Must never
/// block or fail the commit that triggered it.
pub trait LivePush: Send + Sync + 'static {
    fn publish(&self, user_id: Uuid, payload: serde_json::Value);
}
