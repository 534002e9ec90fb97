use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wordshadow_cli::{build_engine, load_settings};
use wordshadow_im::{MemoryEditor, SessionSnapshot, SuggestionEngine};

/// Wordshadow suggestion server
#[derive(Parser, Debug)]
#[command(name = "wordshadow-server")]
#[command(about = "Word suggestion server over an in-memory editor", long_about = None)]
struct Args {
    /// Enable verbose logging (debug level)
    #[arg(short, long)]
    verbose: bool,

    /// Port to listen on
    #[arg(short, long, default_value = "3000")]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Word list (TSV or JSON). Defaults to the configured or bundled lexicon
    #[arg(short, long)]
    lexicon: Option<PathBuf>,

    /// Config file to use instead of the user config
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Clone)]
struct AppState {
    engine: Arc<SuggestionEngine>,
    editor: MemoryEditor,
}

#[derive(Debug, Deserialize)]
struct StartRequest {
    #[serde(default)]
    combining_spec: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WordRequest {
    #[serde(default)]
    word: String,
}

#[derive(Debug, Serialize)]
struct SuggestResponse {
    suggestions: Vec<String>,
    text: String,
}

#[derive(Debug, Serialize)]
struct StateResponse {
    text: String,
    cursor: usize,
    composing: Option<String>,
    session: SessionSnapshot,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Default: info level, with --verbose: debug level
    let default_filter = if args.verbose {
        "wordshadow_server=debug,wordshadow_im=debug,wordshadow_engine=debug,tower_http=debug"
    } else {
        "wordshadow_server=info,wordshadow_im=info,wordshadow_engine=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = load_settings(args.config.as_deref())?;
    let editor = MemoryEditor::new();
    let engine = build_engine(&editor, args.lexicon.as_deref(), settings)?;

    let state = AppState {
        engine: Arc::new(engine),
        editor,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/api/start", post(start_handler))
        .route("/api/finish", post(finish_handler))
        .route("/api/query", post(query_handler))
        .route("/api/pick", post(pick_handler))
        .route("/api/state", get(state_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .with_state(state.clone());

    let addr = format!("{}:{}", args.host, args.port);
    tracing::info!("Starting wordshadow server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    state.engine.release();
    Ok(())
}

/// Run a blocking engine call off the async runtime.
async fn blocking<T, F>(state: &AppState, f: F) -> Result<T, StatusCode>
where
    T: Send + 'static,
    F: FnOnce(&SuggestionEngine) -> T + Send + 'static,
{
    let engine = state.engine.clone();
    tokio::task::spawn_blocking(move || f(&engine))
        .await
        .map_err(|e| {
            tracing::error!("Engine task failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })
}

fn suggest_response(state: &AppState, suggestions: Vec<String>) -> Json<SuggestResponse> {
    Json(SuggestResponse {
        suggestions,
        text: state.editor.text(),
    })
}

async fn start_handler(
    State(state): State<AppState>,
    Json(req): Json<StartRequest>,
) -> Result<StatusCode, StatusCode> {
    tracing::debug!("start: combining_spec={:?}", req.combining_spec);
    blocking(&state, move |engine| {
        engine.start_input(req.combining_spec.as_deref())
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn finish_handler(State(state): State<AppState>) -> Result<StatusCode, StatusCode> {
    blocking(&state, |engine| engine.finish_input()).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn query_handler(
    State(state): State<AppState>,
    Json(req): Json<WordRequest>,
) -> Result<Json<SuggestResponse>, StatusCode> {
    let suggestions = blocking(&state, move |engine| engine.query(&req.word)).await?;
    Ok(suggest_response(&state, suggestions))
}

async fn pick_handler(
    State(state): State<AppState>,
    Json(req): Json<WordRequest>,
) -> Result<Json<SuggestResponse>, StatusCode> {
    if req.word.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    let suggestions = blocking(&state, move |engine| engine.pick(&req.word)).await?;
    Ok(suggest_response(&state, suggestions))
}

async fn state_handler(State(state): State<AppState>) -> Result<Json<StateResponse>, StatusCode> {
    let session = blocking(&state, |engine| engine.snapshot())
        .await?
        .ok_or(StatusCode::SERVICE_UNAVAILABLE)?;
    Ok(Json(StateResponse {
        text: state.editor.text(),
        cursor: state.editor.cursor(),
        composing: state.editor.composing_text(),
        session,
    }))
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "wordshadow-engine"
    }))
}
