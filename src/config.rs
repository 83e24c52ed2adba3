use std::env;

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub gateway: GatewaySettings,
}

/// Credentials and endpoint of the external payment gateway.
///
/// `key_secret` is the shared secret used both for HTTP basic auth on the
/// order-creation call and as the HMAC key for payment signature
/// verification.
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub api_url: String,
    pub key_id: String,
    pub key_secret: String,
    pub currency: String,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("PORT must be a valid number"),
            gateway: GatewaySettings {
                api_url: env::var("GATEWAY_API_URL")
                    .unwrap_or_else(|_| "https://api.razorpay.com/v1".to_string()),
                key_id: env::var("GATEWAY_KEY_ID").expect("GATEWAY_KEY_ID must be set"),
                key_secret: env::var("GATEWAY_KEY_SECRET").expect("GATEWAY_KEY_SECRET must be set"),
                currency: env::var("GATEWAY_CURRENCY").unwrap_or_else(|_| "INR".to_string()),
            },
        }
    }
}
