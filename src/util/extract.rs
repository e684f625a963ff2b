use axum::extract::{FromRequest, Json, Request};
use serde::de::DeserializeOwned;
use tracing::debug;
use validator::Validate;

use crate::util::error::{HandlerError, HandlerErrorKind};

/// JSON body that has been parsed and passed `validator` checks.
///
/// Malformed JSON, unknown fields and failed validation all answer 400.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = HandlerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|rejection| {
            debug!("Rejected request body: {}", rejection.body_text());
            HandlerError::bad_request("Invalid request body").with_details(rejection.body_text())
        })?;

        value.validate().map_err(|e| {
            HandlerError::new(HandlerErrorKind::Validation, format!("Validation error: {}", e))
        })?;

        Ok(ValidatedJson(value))
    }
}
