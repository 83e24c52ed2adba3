use std::sync::Arc;

use dotenvy::dotenv;
use dresshub_orders::config::Settings;
use dresshub_orders::infrastructure::gateway::RestRemoteGateway;
use dresshub_orders::push::InMemoryPush;
use dresshub_orders::{build_server, create_pool, run_migrations};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let settings = Settings::from_env();
    let pool = create_pool(&settings.database_url);
    run_migrations(&pool);

    let gateway = Arc::new(RestRemoteGateway::new(&settings.gateway));
    let push = Arc::new(InMemoryPush::new());

    log::info!(
        "Starting server at http://{}:{}",
        settings.host,
        settings.port
    );

    build_server(
        pool,
        settings.gateway.clone(),
        gateway,
        push,
        &settings.host,
        settings.port,
    )?
    .await
}
