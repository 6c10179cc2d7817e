use argh::FromArgs;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use pictor::{ClientConfig, DescribeError, DescribeSession, OllamaClient, SessionState};
use serde_json::json;

mod messages;

// defaults for the server
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;

type Session = DescribeSession<OllamaClient>;

#[derive(FromArgs)]
/// Pictor serves a single describe session over HTTP.
struct ServerArgs {
    /// the host to run the server on
    #[argh(option, short = 'h', default = "DEFAULT_HOST.to_string()")]
    host: String,

    /// the port to run the server on
    #[argh(option, short = 'p', default = "DEFAULT_PORT")]
    port: u16,

    /// the Ollama server to forward images to
    #[argh(option, short = 'e', default = "ClientConfig::from_env().endpoint")]
    endpoint: String,
}

async fn post_image(
    State(session): State<Session>,
    Json(payload): Json<messages::UploadRequest>,
) -> impl IntoResponse {
    let image = match pictor::decode_data_url(&payload.data_url) {
        Ok(image) => image,
        Err(e) => return error_response(&e),
    };

    let reply = messages::UploadResponse {
        content_type: image.content_type().to_string(),
        size: image.decoded_len(),
    };

    match session.load_image(image) {
        Ok(()) => (StatusCode::OK, Json(json!(reply))),
        Err(e) => error_response(&e),
    }
}

async fn delete_image(State(session): State<Session>) -> impl IntoResponse {
    match session.reset() {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "idle" }))),
        Err(e) => error_response(&e),
    }
}

async fn post_describe(State(session): State<Session>) -> impl IntoResponse {
    if session.state() == SessionState::Requesting {
        log::debug!("Session is still processing");
        return (
            StatusCode::CONFLICT,
            Json(json!({ "status": "error", "message": "Session is still processing" })),
        );
    }

    match session.describe().await {
        Ok(description) => (
            StatusCode::OK,
            Json(json!({ "status": "success", "description": description })),
        ),
        Err(e) => error_response(&e),
    }
}

async fn get_state(State(session): State<Session>) -> impl IntoResponse {
    let state = session.state();
    let (description, error) = match &state {
        SessionState::Succeeded(text) => (Some(text.clone()), None),
        SessionState::Failed(message) => (None, Some(message.clone())),
        _ => (None, None),
    };

    Json(messages::StateResponse {
        status: state.as_str().to_string(),
        description,
        error,
        has_image: session.image().is_some(),
    })
}

/// Routes of the describe surface, bound to one session.
fn app(session: Session) -> Router {
    Router::new()
        .route("/", get(|| async { "Welcome to Pictor!" }))
        .route("/image", post(post_image).delete(delete_image))
        .route("/describe", post(post_describe))
        .route("/state", get(get_state))
        .with_state(session)
}

fn error_response(error: &DescribeError) -> (StatusCode, Json<serde_json::Value>) {
    let status = match error {
        DescribeError::Decode(_) | DescribeError::Validation(_) => StatusCode::BAD_REQUEST,
        DescribeError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        DescribeError::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_GATEWAY,
    };

    (
        status,
        Json(json!({
            "status": "error",
            "kind": error.kind(),
            "message": error.user_message(),
        })),
    )
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: ServerArgs = argh::from_env();

    // format the host and port
    let addr = format!("{}:{}", args.host, args.port);

    let client = OllamaClient::new(ClientConfig::default().with_endpoint(args.endpoint))?;
    let session = DescribeSession::new(client);

    log::info!("Starting the server");
    log::info!("Listening on: {}", addr);
    log::info!("Press Ctrl+C to stop the server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(session)).await?;

    Ok(())
}

#[cfg(test)]
#[path = "../tests/common/mod.rs"]
mod common;
