use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use thiserror::Error;

use crate::domain::errors::CheckoutError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error("unauthorized")]
    Unauthorized,

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable code returned alongside the message.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Checkout(e) => match e {
                CheckoutError::InvalidPayload(_) => "INVALID_PAYLOAD",
                CheckoutError::ProductNotFound(_) => "PRODUCT_NOT_FOUND",
                CheckoutError::SizeNotFound { .. } => "SIZE_NOT_FOUND",
                CheckoutError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
                CheckoutError::AmountMismatch { .. } => "AMOUNT_MISMATCH",
                CheckoutError::SignatureInvalid => "SIGNATURE_INVALID",
                CheckoutError::OrderNotFound => "ORDER_NOT_FOUND",
                CheckoutError::IntegrityConflict(_) => "INTEGRITY_CONFLICT",
                CheckoutError::Gateway(_) => "GATEWAY_ERROR",
                CheckoutError::Internal(_) => "SERVER_ERROR",
            },
            AppError::Unauthorized => "UNAUTHORIZED",
            AppError::Internal(_) => "SERVER_ERROR",
        }
    }
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Checkout(e) => match e {
                CheckoutError::InvalidPayload(_)
                | CheckoutError::SizeNotFound { .. }
                | CheckoutError::InsufficientStock { .. }
                | CheckoutError::AmountMismatch { .. }
                | CheckoutError::SignatureInvalid
                | CheckoutError::IntegrityConflict(_) => StatusCode::BAD_REQUEST,
                CheckoutError::ProductNotFound(_) | CheckoutError::OrderNotFound => {
                    StatusCode::NOT_FOUND
                }
                CheckoutError::Gateway(_) => StatusCode::BAD_GATEWAY,
                CheckoutError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Unexpected constraint violations deserve a trace; plain rejections
        // only clutter the log at error level.
        match self {
            AppError::Checkout(CheckoutError::IntegrityConflict(detail)) => {
                log::error!("integrity conflict during checkout: {}", detail)
            }
            AppError::Checkout(CheckoutError::Internal(detail))
            | AppError::Internal(detail) => log::error!("internal error: {}", detail),
            _ => log::warn!("request rejected: {}", self),
        }

        let message = match self.status_code() {
            // never leak internal diagnostics to the client
            StatusCode::INTERNAL_SERVER_ERROR => "Internal server error".to_string(),
            _ => self.to_string(),
        };

        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "code": self.code(),
            "error": message,
        }))
    }
}

#[cfg(test)]
mod tests {
    use actix_web::ResponseError;
    use uuid::Uuid;

    use super::*;

    #[test]
    fn insufficient_stock_is_a_bad_request() {
        let err = AppError::from(CheckoutError::InsufficientStock {
            product_id: Uuid::new_v4(),
            size: "M".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "INSUFFICIENT_STOCK");
    }

    #[test]
    fn product_not_found_is_404() {
        let err = AppError::from(CheckoutError::ProductNotFound(Uuid::new_v4()));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn signature_invalid_is_a_bad_request() {
        let err = AppError::from(CheckoutError::SignatureInvalid);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "SIGNATURE_INVALID");
    }

    #[test]
    fn amount_mismatch_is_a_bad_request() {
        let err = AppError::from(CheckoutError::AmountMismatch {
            declared: 99_000,
            expected: 100_000,
        });
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "AMOUNT_MISMATCH");
    }

    #[test]
    fn gateway_failure_is_a_bad_gateway() {
        let err = AppError::from(CheckoutError::Gateway("timed out".to_string()));
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn unauthorized_is_401() {
        assert_eq!(AppError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn internal_errors_hide_their_detail() {
        let err = AppError::Internal("pool exhausted on shard 3".to_string());
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["error"], "Internal server error");
        assert_eq!(value["code"], "SERVER_ERROR");
    }
}
