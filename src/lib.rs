pub mod analytics;
pub mod assistant;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod ledger;
pub mod llm;
pub mod models;
pub mod server;
pub mod session;
pub mod store;
pub mod storefront;
pub mod websocket;

use cli::Args;
use log::info;
use server::Server;
use std::error::Error;
use std::sync::Arc;
use storefront::Storefront;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Storefront Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("HTTP API Port: {:?}", args.http_port);
    info!("Catalog Path: {}", args.catalog_path);
    info!("Ledger Type: {}", args.ledger_type);
    info!("Ledger Path: {}", args.ledger_path);
    info!("Prompts Path: {}", args.prompts_path);
    info!("Chat LLM Type: {}", args.chat_llm_type);
    info!("History Window: {}", args.history_window);
    info!("Transcript Limit: {}", args.transcript_limit);
    info!("Confirm Assistant Commands: {}", args.confirm_assistant_commands);
    info!("TLS Enabled: {}", args.enable_tls);
    info!("--------------------------------");

    let storefront = Arc::new(Storefront::from_args(&args)?);
    let addr = args.server_addr.clone();
    info!("Starting server on: {}", addr);
    let server = Server::new(addr, storefront, args.server_api_key.clone(), args.clone());
    server.run().await
}
