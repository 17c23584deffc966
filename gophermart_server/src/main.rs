use clap::Parser;
use dotenvy::dotenv;
use gophermart_server::{
    config::{CliArgs, ServerConfig},
    server::run_server,
};
use log::{error, info};

#[actix_web::main]
async fn main() {
    dotenv().ok();
    env_logger::init();
    let args = CliArgs::parse();
    let config = match ServerConfig::from_args(args) {
        Ok(config) => config,
        Err(e) => {
            error!("🚦️ Preflight check FAILED: {e}");
            eprintln!("🚦️ Preflight check failed. {e}");
            std::process::exit(1);
        },
    };

    info!("🚀️ Starting Gophermart on {}", config.address);
    info!("🚀️ Accrual service at {}, {} workers", config.accrual.address, config.accrual.workers);
    match run_server(config).await {
        Ok(_) => println!("Bye!"),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        },
    }
}
