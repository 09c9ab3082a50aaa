//! HTTP surface for wallet pass generation.
//!
//! ```text
//! POST /api/apple-wallet/generate-pass      build, sign and package a pass
//! GET  /api/apple-wallet/test               signing readiness report
//! GET  /api/apple-wallet/passes/{passId}    download a stored pass
//! ```

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use pkpass::bundle::DirectoryAssets;
use pkpass::delivery::download_file_name;
use pkpass::{
    ErrorKind, GenerationResult, PassGenerator, PassOverrides, PassStore, ReadinessReport,
    SigningIdentity, Violation, WalletConfig, PKPASS_MIME_TYPE,
};
use serde::{Deserialize, Serialize};
use std::path::Path as FsPath;
use std::sync::Arc;

pub struct AppState {
    pub generator: PassGenerator,
    pub config: WalletConfig,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(config: WalletConfig, generator: PassGenerator) -> SharedState {
        Arc::new(Self { generator, config })
    }
}

/// Builds the generator for `config`, storing passes under `storage_dir`.
///
/// Unusable signing material is logged and replaced by the development
/// identity so the service still starts.
pub fn generator_from_config(
    config: &WalletConfig,
    storage_dir: &FsPath,
    assets_dir: Option<&FsPath>,
) -> PassGenerator {
    let identity = config.signing_identity().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "signing material unusable; falling back to placeholder signatures");
        SigningIdentity::DevelopmentPlaceholder
    });
    if !identity.is_production() {
        tracing::warn!("no production signing identity; passes will not install on devices");
    }

    let generator = PassGenerator::new(config.template(), identity, PassStore::new(storage_dir));
    match assets_dir {
        Some(dir) => generator.assets(DirectoryAssets::new(dir)),
        None => generator,
    }
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/api/apple-wallet/generate-pass", post(generate_pass))
        .route("/api/apple-wallet/test", get(test_configuration))
        .route("/api/apple-wallet/passes/{pass_id}", get(download_pass))
        .with_state(state)
}

pub async fn serve(bind: &str, state: SharedState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePassRequest {
    pub user_id: u64,
    pub username: String,
    pub current_balance: f64,
    #[serde(default)]
    pub pass_data: Option<PassOverrides>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePassResponse {
    pub pass_base64: String,
    pub pass_id: String,
    pub serial_number: String,
    pub signed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder_reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<Violation>,
}

fn error_response(status: StatusCode, message: impl Into<String>, violations: Vec<Violation>) -> Response {
    let body = ErrorBody {
        message: message.into(),
        violations,
    };
    (status, Json(body)).into_response()
}

async fn generate_pass(
    State(state): State<SharedState>,
    payload: Result<Json<GeneratePassRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            return error_response(StatusCode::BAD_REQUEST, rejection.body_text(), Vec::new())
        }
    };

    let result = tokio::task::spawn_blocking(move || {
        state.generator.generate_result(
            req.user_id,
            &req.username,
            req.current_balance,
            req.pass_data.as_ref(),
        )
    })
    .await;

    match result {
        Ok(result) => generation_response(result),
        Err(e) => {
            tracing::error!(error = %e, "generation task failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to generate pass", Vec::new())
        }
    }
}

fn generation_response(result: GenerationResult) -> Response {
    if !result.success {
        let status = match result.error_kind {
            Some(ErrorKind::Validation) | Some(ErrorKind::InvalidBalance) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = result.error.unwrap_or_else(|| "Failed to generate pass".into());
        return error_response(status, message, result.violations);
    }

    let body = GeneratePassResponse {
        pass_base64: result.pass_base64.unwrap_or_default(),
        pass_id: result.pass_id.unwrap_or_default(),
        serial_number: result.serial_number.unwrap_or_default(),
        signed: result.signed,
        placeholder_reason: result.placeholder_reason,
    };
    (StatusCode::OK, Json(body)).into_response()
}

async fn test_configuration(State(state): State<SharedState>) -> Json<ReadinessReport> {
    let report = ReadinessReport::check(&state.config);
    if !report.is_ready() {
        tracing::info!(error = report.error.as_deref().unwrap_or(""), "signing not ready");
    }
    Json(report)
}

async fn download_pass(State(state): State<SharedState>, Path(pass_id): Path<String>) -> Response {
    let id = pass_id.clone();
    let opened = tokio::task::spawn_blocking(move || state.generator.store().open(&id)).await;

    match opened {
        Ok(Ok(bytes)) => {
            let disposition = format!("attachment; filename=\"{}\"", download_file_name(&pass_id));
            (
                [
                    (header::CONTENT_TYPE, PKPASS_MIME_TYPE.to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                bytes,
            )
                .into_response()
        }
        Ok(Err(pkpass::Error::PassNotFound(_))) => {
            error_response(StatusCode::NOT_FOUND, format!("Pass not found: {pass_id}"), Vec::new())
        }
        Ok(Err(e)) => {
            tracing::error!(pass_id = %pass_id, error = %e, "failed to read stored pass");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to read pass", Vec::new())
        }
        Err(e) => {
            tracing::error!(error = %e, "download task failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to read pass", Vec::new())
        }
    }
}
