use actix_web::{web, HttpResponse};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::errors::CheckoutError;
use crate::domain::order::OrderStatus;
use crate::errors::AppError;
use crate::handlers::orders::OrderResponse;
use crate::AppCheckoutService;

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    /// One of PROCESSING, SHIPPED, DELIVERED, CANCELLED
    pub status: String,
}

/// PATCH /api/v1/admin/orders/{id}/status
///
/// Admin-only status transition (the upstream gateway enforces the admin
/// role). An actual change writes the owner's inbox notification in the
/// same transaction and fans out a live push after commit.
#[utoipa::path(
    patch,
    path = "/api/v1/admin/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order UUID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = OrderResponse),
        (status = 400, description = "Unknown status value"),
        (status = 404, description = "Order not found"),
    ),
    tag = "admin"
)]
pub async fn update_status(
    svc: web::Data<AppCheckoutService>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let body = body.into_inner();

    let status = OrderStatus::parse(&body.status).ok_or_else(|| {
        AppError::from(CheckoutError::InvalidPayload(format!(
            "invalid status '{}'",
            body.status
        )))
    })?;

    let svc = svc.into_inner();
    let order = web::block(move || svc.set_order_status(order_id, status))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}
