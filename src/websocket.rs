use crate::{
    assistant::AssistantReply,
    models::websocket::{ ClientMessage, ServerMessage },
    session::Session,
    storefront::{ Storefront, StorefrontError },
};
use chrono::Utc;
use futures::{ Sink, SinkExt, StreamExt };
use log::{ info, warn, error };
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{ AsyncRead, AsyncWrite };
use tokio_tungstenite::{ tungstenite::protocol::Message, WebSocketStream };

const MAX_MESSAGE_SIZE: usize = 1 * 1024 * 1024;

/// Runs one client connection. The session lives exactly as long as this call.
pub async fn handle_connection<S>(
    peer: SocketAddr,
    websocket: WebSocketStream<S>,
    storefront: Arc<Storefront>
)
    where S: AsyncRead + AsyncWrite + Unpin
{
    info!("New WebSocket connection: {}", peer);

    match storefront.reload_prompts_if_changed().await {
        Ok(true) => info!("Prompts reloaded for new connection {}", peer),
        Ok(false) => {}
        Err(e) => warn!("Prompt reload skipped: {}", e),
    }

    let (mut tx, mut rx) = websocket.split();
    let mut session = storefront.new_session().await;
    info!("Assigned session ID {} to {}", session.id(), peer);

    if
        !send_message(
            &mut tx,
            peer,
            &(ServerMessage::Transcript { messages: session.transcript().messages() })
        ).await
    {
        return;
    }

    while let Some(msg) = rx.next().await {
        let message = match msg {
            Ok(message) => message,
            Err(e) => {
                match e {
                    | tokio_tungstenite::tungstenite::Error::ConnectionClosed
                    | tokio_tungstenite::tungstenite::Error::Protocol(_)
                    | tokio_tungstenite::tungstenite::Error::Utf8 => {
                        info!("WebSocket connection closed or protocol error for {}: {}", peer, e);
                    }
                    tokio_tungstenite::tungstenite::Error::Io(ref io_err) if
                        io_err.kind() == std::io::ErrorKind::ConnectionReset
                    => {
                        info!("WebSocket connection reset by peer {}", peer);
                    }
                    _ => {
                        error!("Error receiving message from {}: {}", peer, e);
                    }
                }
                break;
            }
        };

        if message.len() > MAX_MESSAGE_SIZE {
            warn!(
                "Message from {} exceeds size limit ({} > {})",
                peer,
                message.len(),
                MAX_MESSAGE_SIZE
            );
            let error_msg = ServerMessage::Error { message: "Message too large".to_string() };
            send_message(&mut tx, peer, &error_msg).await;
            break;
        }

        match message {
            Message::Text(text) => {
                let client_msg = match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(client_msg) => client_msg,
                    Err(e) => {
                        error!("Failed to parse message from {}: {}", peer, e);
                        let error_msg = ServerMessage::Error {
                            message: format!("Failed to parse message: {}", e),
                        };
                        if !send_message(&mut tx, peer, &error_msg).await {
                            break;
                        }
                        continue;
                    }
                };

                if matches!(client_msg, ClientMessage::Chat { .. }) {
                    if !send_message(&mut tx, peer, &ServerMessage::Processing).await {
                        break;
                    }
                }

                let replies = handle_client_message(&storefront, &mut session, client_msg).await;
                let mut delivered = true;
                for reply in &replies {
                    if !send_message(&mut tx, peer, reply).await {
                        delivered = false;
                        break;
                    }
                }
                if !delivered {
                    break;
                }
            }
            Message::Close(_) => {
                info!("Received close frame from {}", peer);
                break;
            }
            Message::Ping(ping_data) => {
                if tx.send(Message::Pong(ping_data)).await.is_err() {
                    error!("Failed to send pong to {}", peer);
                    break;
                }
            }
            Message::Pong(_) => {}
            Message::Binary(_) => {
                warn!("Ignoring binary message from {}", peer);
            }
            Message::Frame(_) => {}
        }
    }
    info!("WebSocket connection closed for {} (Session ID: {})", peer, session.id());
}

async fn send_message<T>(tx: &mut T, peer: SocketAddr, msg: &ServerMessage) -> bool
    where T: Sink<Message> + Unpin, T::Error: std::fmt::Display
{
    let json = match serde_json::to_string(msg) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to serialize message for {}: {}", peer, e);
            return true;
        }
    };
    match tx.send(Message::Text(json)).await {
        Ok(()) => true,
        Err(e) => {
            error!("Error sending message to {}: {}", peer, e);
            false
        }
    }
}

/// Applies one client request to the session and returns what should be sent back, in order.
pub async fn handle_client_message(
    storefront: &Storefront,
    session: &mut Session,
    msg: ClientMessage
) -> Vec<ServerMessage> {
    match msg {
        ClientMessage::Chat { content } => {
            let reply = storefront.chat(session, &content).await;
            let mut out = vec![response(reply.message())];
            match reply {
                AssistantReply::Added { .. } => out.push(cart_snapshot(session)),
                AssistantReply::AwaitingConfirmation { item_name, qty, .. } => {
                    out.push(ServerMessage::PendingCommand { item_name, qty });
                }
                _ => {}
            }
            out
        }
        ClientMessage::ClearChat => {
            storefront.clear_chat(session).await;
            vec![ServerMessage::Transcript { messages: session.transcript().messages() }]
        }
        ClientMessage::ListProducts { category } => {
            vec![ServerMessage::Products {
                products: storefront.products(category.as_deref()).await,
            }]
        }
        ClientMessage::ListCategories => {
            vec![ServerMessage::Categories { categories: storefront.categories().await }]
        }
        ClientMessage::AdjustQuantity { product_id, delta } => {
            match storefront.adjust_quantity(session, product_id, delta).await {
                Ok(qty) => vec![ServerMessage::Quantity { product_id, qty }],
                Err(e) => vec![error_message(e)],
            }
        }
        ClientMessage::AddToCart { product_id, qty } => {
            match storefront.add_to_cart(session, product_id, qty).await {
                Ok(_) => vec![cart_snapshot(session)],
                Err(e) => vec![error_message(e)],
            }
        }
        ClientMessage::RemoveFromCart { index } => {
            match storefront.remove_from_cart(session, index) {
                Ok(()) => vec![cart_snapshot(session)],
                Err(e) => vec![error_message(e)],
            }
        }
        ClientMessage::ClearCart => {
            storefront.clear_cart(session);
            vec![cart_snapshot(session)]
        }
        ClientMessage::ViewCart => {
            storefront.open_cart(session);
            vec![cart_snapshot(session)]
        }
        ClientMessage::CloseCart => {
            storefront.close_cart(session);
            vec![cart_snapshot(session)]
        }
        ClientMessage::Checkout => {
            match storefront.checkout(session).await {
                Ok(order_id) => vec![ServerMessage::OrderPlaced { order_id }, cart_snapshot(session)],
                Err(e) => vec![error_message(e)],
            }
        }
        ClientMessage::ListOrders => {
            vec![ServerMessage::Orders { orders: storefront.orders().await }]
        }
        ClientMessage::CancelOrder { order_id } => {
            match storefront.cancel_order(&order_id).await {
                Ok(_) =>
                    vec![
                        ServerMessage::OrderCancelled { order_id },
                        ServerMessage::Orders { orders: storefront.orders().await }
                    ],
                Err(e) => vec![error_message(e)],
            }
        }
        ClientMessage::Stats => {
            vec![ServerMessage::Stats { stats: storefront.stats().await }]
        }
        ClientMessage::ConfirmCommand => {
            match storefront.confirm_command(session).await {
                Ok(reply) => vec![response(reply.message()), cart_snapshot(session)],
                Err(e) => vec![error_message(e)],
            }
        }
        ClientMessage::RejectCommand => {
            match storefront.reject_command(session).await {
                Ok(message) => vec![response(&message)],
                Err(e) => vec![error_message(e)],
            }
        }
    }
}

fn response(content: &str) -> ServerMessage {
    ServerMessage::Response {
        content: content.to_string(),
        timestamp: Utc::now().timestamp(),
    }
}

fn cart_snapshot(session: &Session) -> ServerMessage {
    let cart = session.cart();
    ServerMessage::Cart {
        lines: cart.lines().to_vec(),
        total: cart.total(),
        item_count: cart.item_count(),
    }
}

fn error_message(e: StorefrontError) -> ServerMessage {
    ServerMessage::Error { message: e.to_string() }
}
