//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling. Incoming requests
//! are dispatched by path prefix to one route group each; CORS headers
//! are applied centrally here so individual handlers never deal with
//! origins.

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::config::Args;
use crate::inference::GeminiClient;
use crate::routes;
use crate::routes::Body;
use crate::store::{AuthClient, StoreClient};
use crate::types::{GatewayError, Result};

/// Shared application state
pub struct AppState {
    pub args: Args,
    /// Relational store (PostgREST table API)
    pub store: StoreClient,
    /// Hosted auth service (GoTrue)
    pub auth: AuthClient,
    /// Generative-language client
    pub gemini: GeminiClient,
}

impl AppState {
    pub fn new(args: Args) -> Result<Self> {
        let service_key = args.service_key().map_err(GatewayError::Config)?;
        let inference_key = args.inference_key().map_err(GatewayError::Config)?;
        let timeout_ms = args.request_timeout_ms;

        let store = StoreClient::new(&args.supabase_url, &service_key, timeout_ms)?;
        let auth = AuthClient::new(&args.supabase_url, &service_key, timeout_ms)?;
        let gemini = GeminiClient::new(
            &args.gemini_api_url,
            &inference_key,
            &args.gemini_model,
            timeout_ms,
        )?;

        Ok(Self {
            args,
            store,
            auth,
            gemini,
        })
    }
}

/// Start the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        "MindMate gateway listening on {} as node {}",
        state.args.listen, state.args.node_id
    );

    if state.args.dev_mode {
        warn!("Development mode enabled - using insecure service key fallback");
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> std::result::Result<Response<Body>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    info!("[{}] {} {}", addr, method, path);

    let origin = req
        .headers()
        .get("origin")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string());

    // Preflight answered here; handlers only ever see real requests
    if method == Method::OPTIONS {
        return Ok(with_cors(preflight_response(), &state.args, origin.as_deref()));
    }

    let response = match (method, path.as_str()) {
        (Method::GET, "/") => routes::root_info(),
        (Method::GET, "/health") => routes::health_check(),
        (_, "/") | (_, "/health") => routes::method_not_allowed(),

        _ if path.starts_with("/api/auth") => routes::handle_auth_request(req, state.clone()).await,
        _ if path.starts_with("/api/users") => {
            routes::handle_users_request(req, state.clone()).await
        }
        _ if path.starts_with("/api/journal") => {
            routes::handle_journal_request(req, state.clone()).await
        }
        _ if path.starts_with("/api/emotion") => {
            routes::handle_emotion_request(req, state.clone()).await
        }
        _ if path.starts_with("/api/therapy") => {
            routes::handle_therapy_request(req, state.clone()).await
        }
        _ if path.starts_with("/api/feelhear") => {
            routes::handle_feelhear_request(req, state.clone()).await
        }
        _ if path.starts_with("/api/meditation") => {
            routes::handle_meditation_request(req, state.clone()).await
        }
        _ if path.starts_with("/api/content") => {
            routes::handle_content_request(req, state.clone()).await
        }
        _ if path.starts_with("/api/digital-wellness") => {
            routes::handle_wellness_request(req, state.clone()).await
        }
        _ if path.starts_with("/api/braingym") => {
            routes::handle_braingym_request(req, state.clone()).await
        }
        _ if path.starts_with("/api/symphony") => {
            routes::handle_symphony_request(req, state.clone()).await
        }
        _ if path.starts_with("/api/gemini") => {
            routes::handle_gemini_request(req, state.clone()).await
        }

        _ => routes::not_found(&path),
    };

    Ok(with_cors(response, &state.args, origin.as_deref()))
}

/// Attach CORS headers when the request origin is on the allow list
fn with_cors(mut response: Response<Body>, args: &Args, origin: Option<&str>) -> Response<Body> {
    let Some(origin) = origin else {
        return response;
    };

    if !origin_allowed(&args.allowed_origin_list(), origin) {
        return response;
    }

    let headers = response.headers_mut();
    if let Ok(value) = origin.parse() {
        headers.insert("Access-Control-Allow-Origin", value);
    }
    headers.insert(
        "Access-Control-Allow-Credentials",
        "true".parse().unwrap(),
    );
    headers.insert("Vary", "Origin".parse().unwrap());
    response
}

/// Exact match against the configured allow list
fn origin_allowed(allowed: &[String], origin: &str) -> bool {
    allowed.iter().any(|a| a == origin)
}

/// CORS preflight response
fn preflight_response() -> Response<Body> {
    Response::builder()
        .status(StatusCode::OK)
        .header("Access-Control-Allow-Headers", "Content-Type, Authorization")
        .header("Access-Control-Allow-Methods", "GET, POST, PUT, DELETE, OPTIONS")
        .body(Full::new(Bytes::new()))
        .unwrap()
}
