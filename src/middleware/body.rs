use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    Json,
};
use serde_json::Value;

use crate::error::ApiError;
use crate::store::Row;

/// JSON request body that must be an object; rejections use the API error shape
#[derive(Debug)]
pub struct JsonObject(pub Row);

#[async_trait]
impl<S> FromRequest<S> for JsonObject
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(request, state)
            .await
            .map_err(rejection_error)?;

        match value {
            Value::Object(row) => Ok(JsonObject(row)),
            _ => Err(ApiError::bad_request("Request body must be a JSON object")),
        }
    }
}

/// Keep the rejection's status (413 over the body limit, 415 for a non-JSON
/// content type); everything else is a malformed body
fn rejection_error(rejection: JsonRejection) -> ApiError {
    let message = rejection.body_text();
    match rejection.status() {
        StatusCode::PAYLOAD_TOO_LARGE => ApiError::payload_too_large(message),
        StatusCode::UNSUPPORTED_MEDIA_TYPE => ApiError::unsupported_media_type(message),
        _ => ApiError::invalid_json(message),
    }
}
