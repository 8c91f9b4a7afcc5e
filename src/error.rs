use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Errors raised when talking to the Session Store's auth API.
///
/// `Rejected` carries the store's own message verbatim so the client sees the
/// same text the store produced ("Invalid login credentials", "User already
/// registered", ...). The other variants cover the store being unreachable or
/// answering with a body we cannot parse.
#[derive(Debug, Error)]
pub enum AuthServiceError {
    #[error("{0}")]
    Rejected(String),
    #[error("session store unreachable: {0}")]
    Transport(String),
    #[error("session store returned a malformed response: {0}")]
    Malformed(String),
}

/// Errors raised by repository operations against the hosted Postgres.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Errors from session-context operations, which touch both the auth provider and
/// the repository.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Auth(#[from] AuthServiceError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Reasons a request failed to resolve to a signed-in user. Guards treat every
/// variant the same way (no session); the distinction exists for the logs.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no bearer token on the request")]
    MissingToken,
    #[error("access token rejected: {0}")]
    InvalidToken(String),
    #[error("token subject has no profile row")]
    UnknownUser,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Unified handler error, mapped to an HTTP status plus a JSON body.
///
/// Handlers return `Result<T, ApiError>`; the conversion to a response is the
/// single place status codes and error bodies are decided.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Upstream(String),
    #[error("{0}")]
    Internal(String),
}

/// JSON error body: `{"error": "<message>"}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Internal details stay in the logs; the client gets a generic line.
        let message = match self {
            ApiError::Internal(msg) => {
                tracing::error!("internal error: {}", msg);
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

impl From<AuthServiceError> for ApiError {
    fn from(err: AuthServiceError) -> Self {
        match err {
            // Default mapping; sign-up flips this to BadRequest at the call site.
            AuthServiceError::Rejected(msg) => ApiError::Unauthorized(msg),
            AuthServiceError::Transport(msg) => ApiError::Upstream(msg),
            AuthServiceError::Malformed(msg) => ApiError::Upstream(msg),
        }
    }
}

impl From<RepoError> for ApiError {
    fn from(err: RepoError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Auth(e) => e.into(),
            SessionError::Repo(e) => e.into(),
        }
    }
}
