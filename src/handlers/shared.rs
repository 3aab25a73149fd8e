use actix_web::HttpResponse;
use serde::{Deserialize, Serialize};

/// Envelope every endpoint responds with.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    // Success with data
    pub fn success(data: T) -> HttpResponse {
        HttpResponse::Ok().json(Self {
            success: true,
            data: Some(data),
            message: None,
        })
    }

    // Success with data and message
    pub fn success_with_message(data: T, message: &str) -> HttpResponse {
        HttpResponse::Ok().json(Self {
            success: true,
            data: Some(data),
            message: Some(message.to_string()),
        })
    }
}

impl ApiResponse<()> {
    // Error response (no data); serialized by AppError::error_response
    pub fn error(message: &str) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.to_string()),
        }
    }
}
