pub mod api;
pub mod websocket;

use crate::cli::Args;
use crate::storefront::Storefront;
use log::{ info, warn };
use std::error::Error;
use std::sync::Arc;

pub struct Server {
    addr: String,
    storefront: Arc<Storefront>,
    api_key: Option<String>,
    args: Args,
}

impl Server {
    pub fn new(addr: String, storefront: Arc<Storefront>, api_key: Option<String>, args: Args) -> Self {
        let api_key = api_key.filter(|k| !k.trim().is_empty());

        if api_key.is_some() {
            info!("Server configured with signed handshake authentication.");
        } else {
            warn!("Server configured WITHOUT authentication. Connections are open.");
        }

        Self { addr, storefront, api_key, args }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        if let Some(http_port) = self.args.http_port {
            api::start_http_server(http_port, self.storefront.clone(), self.args.clone()).await?;
        }

        websocket::start_ws_server(
            &self.addr,
            self.storefront.clone(),
            self.api_key.clone(),
            self.args.clone()
        ).await
    }
}
