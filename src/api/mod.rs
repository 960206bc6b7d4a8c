use crate::{
    api::handlers::{health, repository},
    provisioner::{ProvisionRequest, ProvisionResponse, RepositoryProvisioner},
};
use anyhow::Result;
use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request},
    response::{IntoResponse, Json},
    routing::{get, post},
    Extension, Router,
};
use std::{fmt, str::FromStr, sync::Arc};
use tokio::{net::TcpListener, signal};
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{debug_span, info, Span};
use ulid::Ulid;
use utoipa::OpenApi;

pub mod handlers;

pub use self::handlers::repository::{ErrorBody, Failure};

#[derive(OpenApi)]
#[openapi(
    paths(repository::provision, repository::delete, health::health),
    components(schemas(ProvisionRequest, ProvisionResponse, ErrorBody, health::Health)),
    tags(
        (name = "repository", description = "Tenant repository provisioning"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

/// How failures are reported to the caller.
///
/// `Compatible` keeps the status codes existing orchestrators expect: 404 for an
/// existing or missing repository, 500 for malformed bodies, no response body.
/// `Conventional` uses 409/404/400 and adds a JSON body with a safe error code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusPolicy {
    #[default]
    Compatible,
    Conventional,
}

impl FromStr for StatusPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "compatible" => Ok(Self::Compatible),
            "conventional" => Ok(Self::Conventional),
            _ => Err(format!("invalid status policy: {s}")),
        }
    }
}

impl fmt::Display for StatusPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compatible => f.write_str("compatible"),
            Self::Conventional => f.write_str("conventional"),
        }
    }
}

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

async fn openapi_json() -> impl IntoResponse {
    Json(openapi())
}

/// Build the application router.
pub fn router(provisioner: Arc<dyn RepositoryProvisioner>, policy: StatusPolicy) -> Router {
    Router::new()
        .route(
            "/repository",
            post(repository::provision).delete(repository::delete),
        )
        .route("/health", get(health::health))
        .route("/openapi.json", get(openapi_json))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(Extension(provisioner))
                .layer(Extension(policy)),
        )
}

/// Serve the API until SIGINT or SIGTERM.
/// # Errors
/// Returns an error if the listener cannot be bound or the server fails
pub async fn new(port: u16, app: Router) -> Result<()> {
    let listener = TcpListener::bind(format!("[::]:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Gracefully shutdown");
}

// span
fn make_span(request: &Request<Body>) -> Span {
    let path = request.uri().path();
    let method = request.method().as_str();
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");

    debug_span!("http-request", method, path, request_id)
}
