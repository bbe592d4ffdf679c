//! Webhook HTTP server
//!
//! ## Routes
//!
//! - `POST /apis/:group/v1alpha1/:solver`: solve one challenge
//! - `GET /apis/:group/v1alpha1`: discovery document for the group
//! - `GET /healthz`: liveness
//!
//! Solver failures are not HTTP errors. cert-manager reads the outcome from
//! the `response` of a 200 answer, so only addressing problems (wrong group,
//! unknown solver, empty payload) get a non-200 status.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_server::tls_rustls::RustlsConfig;
use dns01_core::SolverRegistry;
use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::payload::{ApiResourceList, ChallengePayload, ChallengeResponse, SOLVER_VERSION};

/// How long in-flight requests get to finish once shutdown starts
const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(10);

/// Request addressing failures
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("unknown API group {0}")]
    UnknownGroup(String),

    #[error("no solver named {0}")]
    UnknownSolver(String),

    #[error("payload has no request")]
    MissingRequest,
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::UnknownGroup(_) | Self::UnknownSolver(_) => StatusCode::NOT_FOUND,
            Self::MissingRequest => StatusCode::BAD_REQUEST,
        };
        (status, self.to_string()).into_response()
    }
}

/// Build the webhook router over a fully initialized registry
pub fn build_router(registry: Arc<SolverRegistry>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/apis/:group/v1alpha1", get(discovery))
        .route("/apis/:group/v1alpha1/:solver", post(solve))
        .with_state(registry)
}

async fn healthz() -> &'static str {
    "ok"
}

fn check_group(registry: &SolverRegistry, group: &str) -> Result<(), WebhookError> {
    if group != registry.group_name() {
        return Err(WebhookError::UnknownGroup(format!("{}/{}", group, SOLVER_VERSION)));
    }
    Ok(())
}

async fn discovery(
    State(registry): State<Arc<SolverRegistry>>,
    Path(group): Path<String>,
) -> Result<Json<ApiResourceList>, WebhookError> {
    check_group(&registry, &group)?;
    Ok(Json(ApiResourceList::for_solvers(
        registry.group_name(),
        &registry.list_solvers(),
    )))
}

async fn solve(
    State(registry): State<Arc<SolverRegistry>>,
    Path((group, solver)): Path<(String, String)>,
    Json(payload): Json<ChallengePayload>,
) -> Result<Json<ChallengePayload>, WebhookError> {
    check_group(&registry, &group)?;
    if !registry.has_solver(&solver) {
        return Err(WebhookError::UnknownSolver(solver));
    }
    let request = payload.request.ok_or(WebhookError::MissingRequest)?;

    info!(
        "{:?} challenge {} for {} via solver {}",
        request.action, request.uid, request.resolved_fqdn, solver
    );

    let response = match registry.dispatch(&solver, &request).await {
        Ok(()) => ChallengeResponse::success(&request.uid),
        Err(e) => {
            error!(
                "{:?} failed for {} ({}): {}",
                request.action, request.resolved_fqdn, request.uid, e
            );
            ChallengeResponse::failure(&request.uid, e.to_string())
        }
    };

    Ok(Json(ChallengePayload::response(response)))
}

/// PEM certificate chain and private key the webhook serves with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsFiles {
    pub cert_file: PathBuf,
    pub key_file: PathBuf,
}

/// Serve the webhook until `shutdown` resolves
///
/// With `tls` set the webhook speaks HTTPS, which is what the API
/// aggregation layer expects. Without it plain HTTP is served.
pub async fn serve<F>(
    listen: SocketAddr,
    registry: Arc<SolverRegistry>,
    tls: Option<&TlsFiles>,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let router = build_router(registry);

    match tls {
        Some(tls) => serve_tls(listen, router, tls, shutdown).await?,
        None => {
            let listener = tokio::net::TcpListener::bind(listen)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to bind {}: {}", listen, e))?;
            info!("Webhook listening on {} (plain HTTP)", listen);

            axum::serve(listener, router.into_make_service())
                .with_graceful_shutdown(shutdown)
                .await
                .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;
        }
    }

    warn!("Webhook server stopped");
    Ok(())
}

async fn serve_tls<F>(
    listen: SocketAddr,
    router: Router,
    tls: &TlsFiles,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let config = RustlsConfig::from_pem_file(&tls.cert_file, &tls.key_file)
        .await
        .map_err(|e| {
            anyhow::anyhow!(
                "Failed to load TLS certificate {} / key {}: {}",
                tls.cert_file.display(),
                tls.key_file.display(),
                e
            )
        })?;

    let handle = axum_server::Handle::new();
    let stopper = handle.clone();
    tokio::spawn(async move {
        shutdown.await;
        stopper.graceful_shutdown(Some(SHUTDOWN_GRACE_PERIOD));
    });

    info!("Webhook listening on {} (TLS)", listen);
    axum_server::bind_rustls(listen, config)
        .handle(handle)
        .serve(router.into_make_service())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;
    Ok(())
}
