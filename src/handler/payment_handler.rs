use axum::{extract::State, response::IntoResponse, Json};
use std::sync::Arc;

use crate::dto::payment_dto::{CreatePaymentIntentRequest, PaymentIntentResponse};
use crate::service::payment_service::{PaymentService, PaymentServiceImpl};
use crate::util::error::HandlerError;
use crate::util::extract::ValidatedJson;

pub async fn create_payment_intent_handler(
    State(service): State<Arc<PaymentServiceImpl>>,
    ValidatedJson(payload): ValidatedJson<CreatePaymentIntentRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let client_secret = service.create_intent(payload.price, payload.currency).await?;
    Ok(Json(PaymentIntentResponse { client_secret }))
}
