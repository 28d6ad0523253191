use crate::cli::Args;
use crate::storefront::{ Storefront, StorefrontError };
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use axum::{
    extract::{ Path, Query, State },
    http::StatusCode,
    response::{ IntoResponse, Response },
    routing::get,
    Json,
    Router,
};
use serde::{ Deserialize, Serialize };
use tower_http::cors::{ Any, CorsLayer };
use log::{ error, info };

#[derive(Deserialize)]
pub struct ProductQuery {
    pub category: Option<String>,
}

#[derive(Serialize)]
struct ApiMessage {
    success: bool,
    message: String,
}

#[derive(Clone)]
struct AppState {
    storefront: Arc<Storefront>,
}

pub fn router(storefront: Arc<Storefront>) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/api/products", get(products_handler))
        .route("/api/categories", get(categories_handler))
        .route("/api/orders", get(orders_handler))
        .route("/api/orders/{order_id}", axum::routing::delete(cancel_order_handler))
        .route("/api/stats", get(stats_handler))
        .route("/api/reload-prompts", get(reload_prompts_handler))
        .layer(cors)
        .with_state(AppState { storefront })
}

pub async fn start_http_server(
    http_port: u16,
    storefront: Arc<Storefront>,
    args: Args
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let addr = format!("0.0.0.0:{}", http_port).parse::<SocketAddr>()?;
    let app = router(storefront);

    match (args.enable_tls, &args.tls_cert_path, &args.tls_key_path) {
        (true, Some(cert_path), Some(key_path)) => {
            let tls_config = axum_server::tls_rustls::RustlsConfig
                ::from_pem_file(cert_path, key_path).await?;
            info!("Starting HTTPS API server on: https://{}", addr);

            tokio::spawn(async move {
                let result = axum_server
                    ::bind_rustls(addr, tls_config)
                    .serve(app.into_make_service()).await;
                if let Err(e) = result {
                    error!("HTTPS server error: {}", e);
                }
            });
        }
        _ => {
            let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
                format!("Failed to bind HTTP server to {}: {}. Try a different port.", addr, e)
            })?;
            info!("Starting HTTP API server on: http://{}", addr);

            tokio::spawn(async move {
                if let Err(e) = axum::serve(listener, app.into_make_service()).await {
                    error!("HTTP server error: {}", e);
                }
            });
        }
    }

    Ok(())
}

async fn products_handler(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>
) -> impl IntoResponse {
    Json(state.storefront.products(query.category.as_deref()).await)
}

async fn categories_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.storefront.categories().await)
}

async fn orders_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.storefront.orders().await)
}

async fn stats_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.storefront.stats().await)
}

async fn cancel_order_handler(
    State(state): State<AppState>,
    Path(order_id): Path<String>
) -> Response {
    match state.storefront.cancel_order(&order_id).await {
        Ok(removed) =>
            (
                StatusCode::OK,
                Json(ApiMessage {
                    success: true,
                    message: format!("Order {} cancelled ({} line(s))", order_id, removed),
                }),
            ).into_response(),
        Err(e) => {
            let code = match e {
                StorefrontError::OrderNotFound(_) => StatusCode::NOT_FOUND,
                StorefrontError::NotCancellable { .. } => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (code, Json(ApiMessage { success: false, message: e.to_string() })).into_response()
        }
    }
}

async fn reload_prompts_handler(State(state): State<AppState>) -> Response {
    match state.storefront.reload_prompts_if_changed().await {
        Ok(changed) => {
            let message = if changed { "Prompts reloaded" } else { "Prompts unchanged" };
            (StatusCode::OK, Json(ApiMessage { success: true, message: message.into() })).into_response()
        }
        Err(e) =>
            (
                StatusCode::BAD_REQUEST,
                Json(ApiMessage { success: false, message: format!("Reload error: {}", e) }),
            ).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{ to_bytes, Body };
    use axum::http::{ Method, Request };
    use tower::ServiceExt;
    use crate::storefront::tests::storefront;

    async fn call(app: Router, method: Method, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap()).await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn products_can_be_filtered_by_category() {
        let app = router(Arc::new(storefront(&[])));
        let (status, body) = call(app, Method::GET, "/api/products?category=Wind%20Chimes").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["name"], "Moonlit Chime");
    }

    #[tokio::test]
    async fn cancelling_placed_order_over_http() {
        let shop = Arc::new(storefront(&[]));
        let mut session = shop.new_session().await;
        shop.add_to_cart(&mut session, 2, Some(1)).await.unwrap();
        let order_id = shop.checkout(&mut session).await.unwrap();

        let (status, body) = call(router(shop.clone()), Method::GET, "/api/orders").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["order_id"], order_id.as_str());
        assert_eq!(body[0]["status"], "Processing");
        assert_eq!(body[0]["can_cancel"], true);

        let uri = format!("/api/orders/{}", order_id);
        let (status, body) = call(router(shop.clone()), Method::DELETE, &uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let (status, _) = call(router(shop.clone()), Method::DELETE, &uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn stats_on_empty_ledger() {
        let app = router(Arc::new(storefront(&[])));
        let (status, body) = call(app, Method::GET, "/api/stats").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_spent"], 0);
        assert_eq!(body["total_orders"], 0);
    }
}
