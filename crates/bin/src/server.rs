//! HTTP front end for company reports.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use ledgerline::data::RegistrySource;
use ledgerline::{Aggregator, ReportError};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info};

/// Body of `POST /company`.
#[derive(Debug, Deserialize)]
struct CompanyRequest {
    #[serde(default)]
    company_name: Option<String>,
}

/// Routes for the report API.
pub(crate) fn router<S: RegistrySource + 'static>(aggregator: Arc<Aggregator<S>>) -> Router {
    Router::new()
        .route("/company", post(company::<S>).options(preflight))
        .route("/health", get(health))
        .layer(axum::middleware::map_response(allow_any_origin))
        .with_state(aggregator)
}

/// Serve `router` on `bind` until ctrl-c.
pub(crate) async fn serve(bind: SocketAddr, router: Router) -> anyhow::Result<()> {
    let listener = TcpListener::bind(bind).await?;
    info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler available; run until the process is killed
        std::future::pending::<()>().await;
    }
}

async fn company<S: RegistrySource + 'static>(
    State(aggregator): State<Arc<Aggregator<S>>>,
    payload: Result<Json<CompanyRequest>, JsonRejection>,
) -> Response {
    let company_name = match payload {
        Ok(Json(request)) => request.company_name.unwrap_or_default(),
        Err(rejection) => {
            debug!(reason = %rejection.body_text(), "rejected request body");
            return error_response(&ReportError::MissingInput);
        }
    };

    match aggregator.report(&company_name).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => error_response(&e),
    }
}

const fn status_for(error: &ReportError) -> StatusCode {
    match error {
        ReportError::MissingInput => StatusCode::BAD_REQUEST,
        ReportError::CompanyNotFound(_) => StatusCode::NOT_FOUND,
    }
}

fn error_response(error: &ReportError) -> Response {
    (status_for(error), Json(json!({"error": error.to_string()}))).into_response()
}

async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({"status": "ok", "version": ledgerline::VERSION}))
}

async fn allow_any_origin(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("content-type"),
    );
    response
}
