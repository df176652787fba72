use actix_cors::Cors;
use actix_web::{middleware::from_fn, web, App, HttpServer};
use dotenv::dotenv;
use std::net::TcpListener;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use stones_api::auth::handlers::{sign_in, sign_out, sign_up};
use stones_api::shield::{security_middleware, sign_in_throttle};
use stones_api::{api_status, greeting, health_check, AppError, AppState, Settings};

#[actix_web::main]
async fn main() -> stones_api::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    // Load and validate configuration; missing secrets fail here, before any
    // request is served.
    let config = Settings::new()?;
    config.validate()?;
    info!("Configuration loaded successfully");

    info!("Starting server at {}:{}", config.server.host, config.server.port);

    // Initialize application state
    let state = AppState::new(config.clone()).await?;
    let state = web::Data::new(state);

    // Periodically drop idle rate-limit windows
    let limiter_state = state.clone();
    tokio::spawn(async move {
        loop {
            limiter_state.limiter.cleanup().await;
            limiter_state.signin_limiter.cleanup().await;
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
    });

    let listener = TcpListener::bind(format!("{}:{}", config.server.host, config.server.port))?;

    // Start HTTP server
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(from_fn(security_middleware))
            .wrap(Cors::permissive())
            .route("/", web::get().to(greeting))
            .route("/health", web::get().to(health_check))
            .route("/api", web::get().to(api_status))
            .service(
                web::scope("/api/auth")
                    .route("/sign-up", web::post().to(sign_up))
                    .service(
                        web::resource("/sign-in")
                            .wrap(from_fn(sign_in_throttle))
                            .route(web::post().to(sign_in)),
                    )
                    .route("/sign-out", web::post().to(sign_out)),
            )
    })
    .listen(listener)?
    .workers(config.server.workers as usize)
    .run()
    .await
    .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(())
}
