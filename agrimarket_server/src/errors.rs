use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use agrimarket_engine::OrderFlowError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("{0}")]
    OrderFlow(#[from] OrderFlowError),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingToken => StatusCode::UNAUTHORIZED,
                AuthError::ValidationError(_) => StatusCode::UNAUTHORIZED,
                AuthError::PoorlyFormattedToken(_) => StatusCode::BAD_REQUEST,
            },
            Self::OrderFlow(e) => match e {
                OrderFlowError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
                OrderFlowError::InsufficientStock => StatusCode::BAD_REQUEST,
                OrderFlowError::InvalidTransition { .. } => StatusCode::BAD_REQUEST,
                OrderFlowError::CannotCancelDelivered => StatusCode::BAD_REQUEST,
                OrderFlowError::AlreadyCancelled => StatusCode::BAD_REQUEST,
                OrderFlowError::Forbidden(_) => StatusCode::FORBIDDEN,
                OrderFlowError::ProductNotFound(_) => StatusCode::NOT_FOUND,
                OrderFlowError::OrderNotFound(_) => StatusCode::NOT_FOUND,
                OrderFlowError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("An access token is required for this endpoint.")]
    MissingToken,
    #[error("Access token signature is invalid. {0}")]
    ValidationError(String),
    #[error("Access token is not in the correct format. {0}")]
    PoorlyFormattedToken(String),
}
