use crate::cli::Args;
use crate::storefront::Storefront;
use crate::websocket::handle_connection;

use std::collections::HashMap;
use std::error::Error;
use std::fs::File;
use std::io::BufReader;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;

use tokio::io::{ AsyncRead, AsyncWrite };
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::handshake::server::{ ErrorResponse, Request, Response };

use rustls::pki_types::{ CertificateDer, PrivateKeyDer };
use rustls::ServerConfig;
use rustls_pemfile::{ certs, pkcs8_private_keys };

use governor::{ clock::DefaultClock, state::{ InMemoryState, NotKeyed }, Quota, RateLimiter };
use lazy_static::lazy_static;

use chrono::Utc;
use hmac::{ Hmac, Mac };
use sha2::Sha256;
use url::form_urlencoded;

use log::{ error, info, warn };

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_WINDOW_SECS: u64 = 300;

lazy_static! {
    static ref CONNECTION_LIMITER: RateLimiter<NotKeyed, InMemoryState, DefaultClock> =
        RateLimiter::direct(Quota::per_second(NonZeroU32::MIN.saturating_add(9)));
}

pub(crate) fn load_tls_config(
    cert_path: &str,
    key_path: &str
) -> Result<Arc<ServerConfig>, Box<dyn Error + Send + Sync>> {
    let cert_file = File::open(cert_path).map_err(|e|
        format!("Failed to open TLS certificate file '{}': {}", cert_path, e)
    )?;
    let key_file = File::open(key_path).map_err(|e|
        format!("Failed to open TLS key file '{}': {}", key_path, e)
    )?;

    let cert_chain: Vec<CertificateDer<'static>> = certs(&mut BufReader::new(cert_file))
        .collect::<Result<_, _>>()
        .map_err(|e| format!("Failed to read certificate(s): {}", e))?;

    let key = match pkcs8_private_keys(&mut BufReader::new(key_file)).next() {
        Some(Ok(k)) => PrivateKeyDer::Pkcs8(k),
        Some(Err(e)) => {
            return Err(format!("Error reading private key: {}", e).into());
        }
        None => {
            return Err("No PKCS8 private key found in key file".into());
        }
    };

    let config = ServerConfig::builder().with_no_client_auth().with_single_cert(cert_chain, key)?;
    Ok(Arc::new(config))
}

fn build_tls_acceptor(args: &Args) -> Result<Option<TlsAcceptor>, Box<dyn Error + Send + Sync>> {
    if !args.enable_tls {
        info!("TLS not enabled. Running plain WebSocket (WS) server.");
        return Ok(None);
    }
    match (&args.tls_cert_path, &args.tls_key_path) {
        (Some(cert_path), Some(key_path)) => {
            info!("TLS enabled. Loading certificate from '{}' and key from '{}'", cert_path, key_path);
            Ok(Some(TlsAcceptor::from(load_tls_config(cert_path, key_path)?)))
        }
        _ => {
            error!("Both --tls-cert-path and --tls-key-path must be provided to enable TLS.");
            Err("Missing TLS certificate or key path".into())
        }
    }
}

pub async fn start_ws_server(
    addr: &str,
    storefront: Arc<Storefront>,
    api_key: Option<String>,
    args: Args
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let tls_acceptor = build_tls_acceptor(&args)?;
    let listener = TcpListener::bind(addr).await?;
    let protocol = if tls_acceptor.is_some() { "WSS" } else { "WS" };
    info!("{} server listening on: {}", protocol, addr);

    loop {
        let (stream, peer) = listener.accept().await?;

        if CONNECTION_LIMITER.check().is_err() {
            warn!("Global connection rate limit exceeded for {}. Dropping connection.", peer);
            continue;
        }

        info!("Incoming connection from: {}", peer);
        let storefront = Arc::clone(&storefront);
        let required_api_key = api_key.clone();
        let tls_acceptor = tls_acceptor.clone();

        tokio::spawn(async move {
            let result = match tls_acceptor {
                Some(acceptor) =>
                    match acceptor.accept(stream).await {
                        Ok(tls_stream) => {
                            info!("TLS handshake successful for {}", peer);
                            process_connection(peer, tls_stream, storefront, required_api_key).await
                        }
                        Err(e) => {
                            error!("TLS handshake error for {}: {}", peer, e);
                            Err(Box::new(e) as Box<dyn Error + Send + Sync>)
                        }
                    }
                None => process_connection(peer, stream, storefront, required_api_key).await,
            };

            if let Err(e) = result {
                error!("Failed to process connection for {}: {}", peer, e);
            }
        });
    }
}

/// Checks `ts`/`sig` query parameters: `sig` must be hex HMAC-SHA256 of `ts` keyed by the
/// server secret, and `ts` within five minutes of `now`.
pub(crate) fn verify_signature(
    secret: &str,
    query: &str,
    now: i64
) -> Result<(), &'static str> {
    let params: HashMap<String, String> = form_urlencoded
        ::parse(query.as_bytes())
        .into_owned()
        .collect();

    let (Some(ts), Some(sig)) = (params.get("ts"), params.get("sig")) else {
        return Err("missing ts/sig");
    };
    let ts_i: i64 = ts.parse().map_err(|_| "bad timestamp")?;
    if now.abs_diff(ts_i) > SIGNATURE_WINDOW_SECS {
        return Err("timestamp out of range");
    }

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| "bad server key")?;
    mac.update(ts.as_bytes());
    let expected = hex::encode(mac.finalize().into_bytes());
    if expected.eq_ignore_ascii_case(sig) {
        Ok(())
    } else {
        Err("bad signature")
    }
}

fn unauthorized(reason: &str) -> ErrorResponse {
    let mut res = ErrorResponse::new(Some(reason.to_string()));
    *res.status_mut() = tokio_tungstenite::tungstenite::http::StatusCode::UNAUTHORIZED;
    res
}

async fn process_connection<S>(
    peer: SocketAddr,
    stream: S,
    storefront: Arc<Storefront>,
    required_api_key: Option<String>
) -> Result<(), Box<dyn Error + Send + Sync>>
    where S: AsyncRead + AsyncWrite + Unpin + Send + 'static
{
    let auth_callback = |req: &Request, response: Response| -> Result<Response, ErrorResponse> {
        let secret = match &required_api_key {
            Some(k) if !k.is_empty() => k,
            _ => {
                return Ok(response);
            }
        };
        let query = req.uri().query().unwrap_or("");
        match verify_signature(secret, query, Utc::now().timestamp()) {
            Ok(()) => {
                info!("{} authenticated", peer);
                Ok(response)
            }
            Err(reason) => {
                warn!("{}: handshake rejected ({})", peer, reason);
                Err(unauthorized(reason))
            }
        }
    };

    match accept_hdr_async(stream, auth_callback).await {
        Ok(ws) => {
            handle_connection(peer, ws, storefront).await;
            Ok(())
        }
        Err(e) => {
            error!("Handshake failed for {}: {}", peer, e);
            Err(Box::new(e) as _)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, ts: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(ts.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn valid_signature_is_accepted() {
        let sig = sign("s3cret", "1700000000");
        let query = format!("ts=1700000000&sig={}", sig);
        assert_eq!(verify_signature("s3cret", &query, 1700000100), Ok(()));
    }

    #[test]
    fn stale_or_wrong_signatures_are_rejected() {
        let sig = sign("s3cret", "1700000000");
        let query = format!("ts=1700000000&sig={}", sig);
        assert_eq!(verify_signature("s3cret", &query, 1700001000), Err("timestamp out of range"));
        assert_eq!(verify_signature("other", &query, 1700000000), Err("bad signature"));
        assert_eq!(verify_signature("s3cret", "ts=1700000000", 1700000000), Err("missing ts/sig"));
        assert_eq!(verify_signature("s3cret", "ts=soon&sig=ab", 1700000000), Err("bad timestamp"));
        assert_eq!(
            verify_signature("s3cret", "ts=-9223372036854775808&sig=00", 1700000000),
            Err("timestamp out of range")
        );
    }
}
