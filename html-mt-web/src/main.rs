use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use html_mt::mt::validate_locale;
use html_mt::{
    Config, ContentStore, EntryLocalizer, HtmlPipeline, LocalizationReport, LocalizationRequest,
    MtError,
};

const DEFAULT_BIND: &str = "127.0.0.1:3000";

#[derive(Serialize, Deserialize)]
pub struct TranslateRequest {
    pub html: String,
    pub target_locale: String,
}

#[derive(Serialize, Deserialize)]
pub struct TranslateResponse {
    pub translated: String,
}

#[derive(Serialize, Deserialize, Default)]
pub struct EntryTranslateRequest {
    /// Content type route name, defaults to the configured one
    pub uid: Option<String>,
    /// Single target locale; all store locales when absent
    pub target_locale: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct LocaleResult {
    pub locale: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct TaxonomyResult {
    pub uid: String,
    pub document_id: String,
    pub locale: Option<String>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct EntryTranslateResponse {
    pub success: bool,
    pub document_id: String,
    pub results: Vec<LocaleResult>,
    pub taxonomy: Vec<TaxonomyResult>,
}

impl From<LocalizationReport> for EntryTranslateResponse {
    fn from(report: LocalizationReport) -> Self {
        Self {
            success: report.is_success(),
            results: report
                .outcomes
                .into_iter()
                .map(|outcome| {
                    let (title, error) = match outcome.result {
                        Ok(title) => (Some(title), None),
                        Err(e) => (None, Some(e.to_string())),
                    };
                    LocaleResult {
                        locale: outcome.locale,
                        success: error.is_none(),
                        title,
                        error,
                    }
                })
                .collect(),
            taxonomy: report
                .taxonomy
                .into_iter()
                .map(|outcome| TaxonomyResult {
                    uid: outcome.uid,
                    document_id: outcome.document_id,
                    locale: outcome.locale,
                    success: outcome.result.is_ok(),
                    error: outcome.result.err().map(|e| e.to_string()),
                })
                .collect(),
            document_id: report.document_id,
        }
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Maps pipeline errors onto HTTP statuses
pub struct ApiError(MtError);

impl From<MtError> for ApiError {
    fn from(err: MtError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            MtError::InvalidLocale(_) | MtError::InvalidContentType(_) => StatusCode::BAD_REQUEST,
            MtError::NotFound(_) => StatusCode::NOT_FOUND,
            MtError::Network(_)
            | MtError::Provider { .. }
            | MtError::Store { .. }
            | MtError::StructuralMismatch(_) => StatusCode::BAD_GATEWAY,
            MtError::Config(_) | MtError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ContentStore>,
    pub localizer: Arc<EntryLocalizer>,
    pub default_uid: String,
    pub draft: bool,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/locales", get(list_locales))
        .route("/api/translate", post(translate_html))
        .route("/api/entries/{id}/translate", post(translate_entry))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let config = Config::from_env().map_err(|e| format!("Invalid configuration: {}", e))?;
    let provider = config
        .deepl_provider()
        .map_err(|e| format!("Failed to initialize translator: {}", e))?;
    let store: Arc<dyn ContentStore> = Arc::new(
        config
            .strapi_client()
            .map_err(|e| format!("Failed to initialize content store: {}", e))?,
    );

    let pipeline = HtmlPipeline::new(config.chunked(Arc::new(provider)));
    let localizer = EntryLocalizer::new(store.clone(), pipeline)
        .with_source_locale(&config.source_locale)
        .with_link_rules(config.links.clone());
    let state = AppState {
        store,
        localizer: Arc::new(localizer),
        default_uid: config.content_type.clone(),
        draft: config.draft,
    };

    info!("Starting html-mt web server");

    let bind = std::env::var("HTML_MT_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!("Server running at http://{}", bind);

    axum::serve(listener, router(state)).await?;

    Ok(())
}

async fn list_locales(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.store.get_all_locales().await?))
}

async fn translate_html(
    State(state): State<AppState>,
    Json(request): Json<TranslateRequest>,
) -> Result<Json<TranslateResponse>, ApiError> {
    validate_locale(&request.target_locale)?;
    info!(
        target_locale = %request.target_locale,
        chars = request.html.chars().count(),
        "Translating HTML"
    );

    let translated = state
        .localizer
        .pipeline()
        .translate_html(&request.html, &request.target_locale)
        .await?;

    Ok(Json(TranslateResponse { translated }))
}

async fn translate_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<EntryTranslateRequest>,
) -> Result<Json<EntryTranslateResponse>, ApiError> {
    if let Some(locale) = &request.target_locale {
        validate_locale(locale)?;
    }

    let uid = request.uid.as_deref().unwrap_or(&state.default_uid);
    info!(uid, id = %id, target_locale = ?request.target_locale, "Translating entry");

    let localization = LocalizationRequest::by_id(uid, &id)
        .with_locales(request.target_locale)
        .with_draft(state.draft);
    let report = state.localizer.localize(&localization).await?;

    Ok(Json(report.into()))
}
