use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::checkout::GatewayCheckout;
use crate::config::GatewaySettings;
use crate::domain::order::{CheckoutLine, OrderView};
use crate::domain::ports::RemoteGateway;
use crate::errors::AppError;
use crate::handlers::auth::AuthenticatedUser;
use crate::AppCheckoutService;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutLineRequest {
    pub product: Uuid,
    pub quantity: i32,
    /// Size token, e.g. "M" or "32"
    pub size: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CodCheckoutRequest {
    pub orders: Vec<CheckoutLineRequest>,
    pub shipping_address: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GatewayCreateRequest {
    pub orders: Vec<CheckoutLineRequest>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GatewayVerifyRequest {
    pub gateway_order_id: String,
    pub gateway_payment_id: String,
    /// Hex HMAC signature issued by the gateway for this order/payment pair
    pub gateway_signature: String,
    pub orders: Vec<CheckoutLineRequest>,
    /// Amount the client was charged, in minor units (e.g. paise)
    pub amount: i64,
    pub shipping_address: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateAddressRequest {
    pub shipping_address: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub size: String,
    pub quantity: i32,
    /// Decimal price as a string to avoid floating-point issues, e.g. "499.50"
    pub price: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub total_amount: String,
    pub payment_status: String,
    pub order_status: String,
    pub gateway_order_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    pub shipping_address: Option<String>,
    pub phone: Option<String>,
    pub created_at: String,
    pub items: Vec<OrderItemResponse>,
}

impl From<OrderView> for OrderResponse {
    fn from(order: OrderView) -> Self {
        Self {
            id: order.id,
            total_amount: order.total_amount.to_string(),
            payment_status: order.payment_status.as_str().to_string(),
            order_status: order.order_status.as_str().to_string(),
            gateway_order_id: order.gateway_order_id,
            gateway_payment_id: order.gateway_payment_id,
            shipping_address: order.shipping_address,
            phone: order.phone,
            created_at: order.created_at.to_rfc3339(),
            items: order
                .items
                .into_iter()
                .map(|i| OrderItemResponse {
                    id: i.id,
                    product_id: i.product_id,
                    size: i.size,
                    quantity: i.quantity,
                    price: i.price.to_string(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutResponse {
    pub message: String,
    pub total_amount: String,
    pub order: OrderResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GatewayCreateResponse {
    pub message: String,
    pub gateway_order_id: String,
    /// Key id the client hands to the gateway SDK
    pub gateway_key: String,
    /// Amount in minor units (e.g. paise)
    pub amount: i64,
    pub currency: String,
}

fn domain_lines(lines: &[CheckoutLineRequest]) -> Vec<CheckoutLine> {
    lines
        .iter()
        .map(|l| CheckoutLine {
            product_id: l.product,
            size: l.size.clone(),
            quantity: l.quantity,
        })
        .collect()
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /api/v1/orders/checkout/cod
///
/// Cash-on-delivery checkout: reserves stock, persists the order and clears
/// the purchased cart rows in one transaction. Payment stays PENDING.
#[utoipa::path(
    post,
    path = "/api/v1/orders/checkout/cod",
    request_body = CodCheckoutRequest,
    responses(
        (status = 201, description = "Order created", body = CheckoutResponse),
        (status = 400, description = "Invalid payload or insufficient stock"),
        (status = 404, description = "Referenced product not found"),
    ),
    tag = "checkout"
)]
pub async fn cod_checkout(
    svc: web::Data<AppCheckoutService>,
    user: AuthenticatedUser,
    body: web::Json<CodCheckoutRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let lines = domain_lines(&body.orders);

    let svc = svc.into_inner();
    let order = web::block(move || {
        svc.checkout_cod(user.0, lines, body.shipping_address, body.phone)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(CheckoutResponse {
        message: "Order placed (COD)".to_string(),
        total_amount: order.total_amount.to_string(),
        order: order.into(),
    }))
}

/// POST /api/v1/orders/checkout/gateway/create
///
/// Prices the requested lines and registers the charge with the payment
/// gateway. Nothing is persisted locally; the client completes payment with
/// the gateway SDK and then calls the verify endpoint.
#[utoipa::path(
    post,
    path = "/api/v1/orders/checkout/gateway/create",
    request_body = GatewayCreateRequest,
    responses(
        (status = 201, description = "Remote order registered", body = GatewayCreateResponse),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Referenced product not found"),
        (status = 502, description = "Payment gateway unreachable"),
    ),
    tag = "checkout"
)]
pub async fn gateway_create(
    svc: web::Data<AppCheckoutService>,
    gateway: web::Data<dyn RemoteGateway>,
    settings: web::Data<GatewaySettings>,
    _user: AuthenticatedUser,
    body: web::Json<GatewayCreateRequest>,
) -> Result<HttpResponse, AppError> {
    let lines = domain_lines(&body.orders);

    let svc = svc.into_inner();
    let quote = web::block(move || svc.quote(&lines))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    let gateway_order_id = gateway
        .create_order(quote.amount_minor, &settings.currency)
        .await?;

    Ok(HttpResponse::Created().json(GatewayCreateResponse {
        message: "Gateway order created".to_string(),
        gateway_order_id,
        gateway_key: settings.key_id.clone(),
        amount: quote.amount_minor,
        currency: settings.currency.clone(),
    }))
}

/// POST /api/v1/orders/checkout/gateway/verify
///
/// Verifies the gateway's payment assertion (amount first, then signature)
/// and, only on success, runs the same transactional checkout as the CoD
/// path with payment already PAID.
#[utoipa::path(
    post,
    path = "/api/v1/orders/checkout/gateway/verify",
    request_body = GatewayVerifyRequest,
    responses(
        (status = 201, description = "Payment verified, order created", body = CheckoutResponse),
        (status = 400, description = "Amount mismatch, bad signature, or insufficient stock"),
        (status = 404, description = "Referenced product not found"),
    ),
    tag = "checkout"
)]
pub async fn gateway_verify(
    svc: web::Data<AppCheckoutService>,
    user: AuthenticatedUser,
    body: web::Json<GatewayVerifyRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let checkout = GatewayCheckout {
        lines: domain_lines(&body.orders),
        declared_amount_minor: body.amount,
        gateway_order_id: body.gateway_order_id,
        gateway_payment_id: body.gateway_payment_id,
        gateway_signature: body.gateway_signature,
        shipping_address: body.shipping_address,
        phone: body.phone,
    };

    let svc = svc.into_inner();
    let order = web::block(move || svc.checkout_gateway(user.0, checkout))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(CheckoutResponse {
        message: "Payment verified and order created".to_string(),
        total_amount: order.total_amount.to_string(),
        order: order.into(),
    }))
}

/// GET /api/v1/orders
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    responses(
        (status = 200, description = "The caller's orders, newest first", body = [OrderResponse]),
        (status = 401, description = "Missing or invalid identity"),
    ),
    tag = "orders"
)]
pub async fn my_orders(
    svc: web::Data<AppCheckoutService>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let svc = svc.into_inner();
    let orders = web::block(move || svc.my_orders(user.0))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    let orders: Vec<OrderResponse> = orders.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(orders))
}

/// GET /api/v1/orders/{id}
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    params(("id" = Uuid, Path, description = "Order UUID")),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 404, description = "No such order for this user"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    svc: web::Data<AppCheckoutService>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let svc = svc.into_inner();
    let order = web::block(move || svc.order(user.0, order_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// PATCH /api/v1/orders/{id}/address
///
/// Owner-scoped shipping-address update. Does not touch the order status,
/// so it never produces a notification.
#[utoipa::path(
    patch,
    path = "/api/v1/orders/{id}/address",
    params(("id" = Uuid, Path, description = "Order UUID")),
    request_body = UpdateAddressRequest,
    responses(
        (status = 200, description = "Address updated", body = OrderResponse),
        (status = 400, description = "Missing shipping_address"),
        (status = 404, description = "No such order for this user"),
    ),
    tag = "orders"
)]
pub async fn update_address(
    svc: web::Data<AppCheckoutService>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
    body: web::Json<UpdateAddressRequest>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let body = body.into_inner();
    let svc = svc.into_inner();
    let order = web::block(move || svc.update_address(user.0, order_id, &body.shipping_address))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}
