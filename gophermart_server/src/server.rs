use actix_web::{dev::Server, middleware::{Compress, Logger}, web, App, HttpServer};
use gophermart_engine::{AccountApi, OrdersApi, SqliteDatabase};
use log::*;
use tokio::sync::watch;

use crate::{
    accrual::{start_accrual_pipeline, AccrualClient},
    auth::TokenIssuer,
    config::ServerConfig,
    errors::ServerError,
    middleware::AuthMiddlewareFactory,
    routes::{balance, health, login, order_history, register, submit_order, withdraw, withdrawals},
};

/// Runs the service to completion: connects the ledger (applying migrations),
/// starts the accrual pipeline, serves HTTP until the process is told to stop
/// and then tears everything down in order.
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_uri, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    info!("🗃️ Ledger ready at {}", db.url());
    let client = AccrualClient::new(&config.accrual).map_err(|e| ServerError::InitializeError(e.to_string()))?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let pipeline = start_accrual_pipeline(db.clone(), client, &config.accrual, shutdown_rx);

    let srv = create_server_instance(config, db.clone())?;
    // actix installs its own SIGINT/SIGTERM handler and stops gracefully,
    // letting in-flight requests finish within the shutdown timeout.
    let result = srv.await.map_err(|e| ServerError::Internal(e.to_string()));

    info!("🛑️ HTTP server stopped; shutting down the accrual pipeline");
    let _ = shutdown_tx.send(true);
    for handle in pipeline {
        let _ = handle.await;
    }
    db.pool().close().await;
    info!("🛑️ Ledger pool closed");
    result
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    let address = config.address.clone();
    let shutdown_timeout = config.shutdown_timeout.as_secs();
    let srv = HttpServer::new(move || {
        let orders_api = OrdersApi::new(db.clone());
        let account_api = AccountApi::new(db.clone());
        let signer = TokenIssuer::new(&config.auth);
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %U"))
            .wrap(Compress::default())
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(account_api))
            .app_data(web::Data::new(signer))
            .service(health)
            .service(
                web::scope("/api/user")
                    .route("/register", web::post().to(register::<SqliteDatabase>))
                    .route("/login", web::post().to(login::<SqliteDatabase>))
                    .service(
                        web::scope("")
                            .wrap(AuthMiddlewareFactory::new(config.auth.jwt_secret.clone()))
                            .route("/orders", web::post().to(submit_order::<SqliteDatabase>))
                            .route("/orders", web::get().to(order_history::<SqliteDatabase>))
                            .route("/balance", web::get().to(balance::<SqliteDatabase>))
                            .route("/balance/withdraw", web::post().to(withdraw::<SqliteDatabase>))
                            .route("/withdrawals", web::get().to(withdrawals::<SqliteDatabase>)),
                    ),
            )
    })
    .shutdown_timeout(shutdown_timeout)
    .bind(address)?
    .run();
    Ok(srv)
}
