use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;
use crate::handlers::auth::AuthenticatedUser;
use crate::AppCheckoutService;

#[derive(Debug, Serialize, ToSchema)]
pub struct NotificationResponse {
    pub id: Uuid,
    pub message: String,
    pub read: bool,
    pub created_at: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MarkReadRequest {
    /// Mark a single notification; omit to mark all of the caller's.
    pub id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MarkReadResponse {
    pub message: String,
    pub updated: usize,
}

/// GET /api/v1/notifications
#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    responses(
        (status = 200, description = "The caller's notifications, newest first", body = [NotificationResponse]),
        (status = 401, description = "Missing or invalid identity"),
    ),
    tag = "notifications"
)]
pub async fn list(
    svc: web::Data<AppCheckoutService>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let svc = svc.into_inner();
    let notes = web::block(move || svc.notifications(user.0))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    let notes: Vec<NotificationResponse> = notes
        .into_iter()
        .map(|n| NotificationResponse {
            id: n.id,
            message: n.message,
            read: n.read,
            created_at: n.created_at.to_rfc3339(),
        })
        .collect();
    Ok(HttpResponse::Ok().json(notes))
}

/// PATCH /api/v1/notifications
#[utoipa::path(
    patch,
    path = "/api/v1/notifications",
    request_body = MarkReadRequest,
    responses(
        (status = 200, description = "Notifications marked read", body = MarkReadResponse),
        (status = 401, description = "Missing or invalid identity"),
    ),
    tag = "notifications"
)]
pub async fn mark_read(
    svc: web::Data<AppCheckoutService>,
    user: AuthenticatedUser,
    body: web::Json<MarkReadRequest>,
) -> Result<HttpResponse, AppError> {
    let note_id = body.into_inner().id;
    let svc = svc.into_inner();
    let updated = web::block(move || svc.mark_notifications_read(user.0, note_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(MarkReadResponse {
        message: "notifications updated".to_string(),
        updated,
    }))
}
