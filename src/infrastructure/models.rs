use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::{notifications, order_items, orders, product_sizes, products};

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductRow {
    pub id: Uuid,
    pub name: String,
    pub new_price: BigDecimal,
    pub old_price: Option<BigDecimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = product_sizes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductSizeRow {
    pub id: Uuid,
    pub product_id: Uuid,
    pub size: String,
    pub stock: i32,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub total_amount: BigDecimal,
    pub gateway_order_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    pub gateway_signature: Option<String>,
    pub payment_status: String,
    pub order_status: String,
    pub shipping_address: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrderRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub total_amount: BigDecimal,
    pub gateway_order_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    pub gateway_signature: Option<String>,
    pub payment_status: String,
    pub order_status: String,
    pub shipping_address: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = order_items)]
#[diesel(belongs_to(OrderRow, foreign_key = order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderItemRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub size: String,
    pub quantity: i32,
    pub price: BigDecimal,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_items)]
pub struct NewOrderItemRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub size: String,
    pub quantity: i32,
    pub price: BigDecimal,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = notifications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NotificationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = notifications)]
pub struct NewNotificationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub message: String,
}
