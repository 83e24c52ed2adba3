pub mod application;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod payment;
pub mod push;
pub mod schema;

use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpResponse, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use application::checkout::CheckoutService;
use config::GatewaySettings;
use domain::ports::RemoteGateway;
use infrastructure::checkout_repo::DieselCheckoutRepository;
use payment::SignatureVerifier;
use push::InMemoryPush;

pub use db::{create_pool, DbPool};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// The orchestrator as wired in production: Diesel storage underneath.
pub type AppCheckoutService = CheckoutService<DieselCheckoutRepository>;

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) {
    let mut conn = pool.get().expect("Failed to get DB connection for migrations");
    conn.run_pending_migrations(MIGRATIONS)
        .expect("Failed to run database migrations");
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::orders::cod_checkout,
        handlers::orders::gateway_create,
        handlers::orders::gateway_verify,
        handlers::orders::my_orders,
        handlers::orders::get_order,
        handlers::orders::update_address,
        handlers::notifications::list,
        handlers::notifications::mark_read,
        handlers::admin::update_status,
    ),
    components(schemas(
        handlers::orders::CheckoutLineRequest,
        handlers::orders::CodCheckoutRequest,
        handlers::orders::GatewayCreateRequest,
        handlers::orders::GatewayVerifyRequest,
        handlers::orders::UpdateAddressRequest,
        handlers::orders::OrderItemResponse,
        handlers::orders::OrderResponse,
        handlers::orders::CheckoutResponse,
        handlers::orders::GatewayCreateResponse,
        handlers::notifications::NotificationResponse,
        handlers::notifications::MarkReadRequest,
        handlers::notifications::MarkReadResponse,
        handlers::admin::UpdateStatusRequest,
    )),
    tags(
        (name = "checkout", description = "Cash-on-delivery and gateway-verified checkout"),
        (name = "orders", description = "Order queries and address updates"),
        (name = "notifications", description = "Order-status notification inbox"),
        (name = "admin", description = "Admin order-status transitions"),
    )
)]
struct ApiDoc;

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "dresshub_orders",
    }))
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server. `push` is shared with the websocket surface that
/// subscribes users on connection establishment.
pub fn build_server(
    pool: DbPool,
    settings: GatewaySettings,
    gateway: Arc<dyn RemoteGateway>,
    push: Arc<InMemoryPush>,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let service = CheckoutService::new(
        DieselCheckoutRepository::new(pool),
        SignatureVerifier::new(settings.key_secret.as_bytes()),
        push,
    );
    let service = web::Data::new(service);
    let settings = web::Data::new(settings);
    let gateway = web::Data::from(gateway);

    Ok(HttpServer::new(move || {
        App::new()
            .app_data(service.clone())
            .app_data(settings.clone())
            .app_data(gateway.clone())
            .wrap(Logger::default())
            .route("/health", web::get().to(health))
            .service(
                web::scope("/api/v1")
                    .service(
                        web::scope("/orders")
                            .route(
                                "/checkout/cod",
                                web::post().to(handlers::orders::cod_checkout),
                            )
                            .route(
                                "/checkout/gateway/create",
                                web::post().to(handlers::orders::gateway_create),
                            )
                            .route(
                                "/checkout/gateway/verify",
                                web::post().to(handlers::orders::gateway_verify),
                            )
                            .route("", web::get().to(handlers::orders::my_orders))
                            .route("/{id}", web::get().to(handlers::orders::get_order))
                            .route(
                                "/{id}/address",
                                web::patch().to(handlers::orders::update_address),
                            ),
                    )
                    .service(
                        web::scope("/notifications")
                            .route("", web::get().to(handlers::notifications::list))
                            .route("", web::patch().to(handlers::notifications::mark_read)),
                    )
                    .service(web::scope("/admin").route(
                        "/orders/{id}/status",
                        web::patch().to(handlers::admin::update_status),
                    )),
            )
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", ApiDoc::openapi()),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}
