use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::model::user::User;

/// Body of `POST /reviews`. The reviewer is the caller.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateReviewRequest {
    #[validate(email)]
    pub deliver_mail: String,
    #[validate(range(min = 1, max = 5))]
    pub rating: u8,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub feedback: String,
    #[validate(length(min = 1, max = 64))]
    pub parcel_id: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub reviewer_name: Option<String>,
    #[validate(url)]
    pub reviewer_photo: Option<String>,
}

/// One row of `GET /delivery-men`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryManSummary {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub delivery_count: i64,
    pub average_rating: f64,
    pub review_count: i64,
}

impl DeliveryManSummary {
    pub fn new(user: User, average_rating: f64, review_count: i64) -> Self {
        DeliveryManSummary {
            email: user.email,
            name: user.name,
            photo: user.photo,
            phone: user.phone,
            delivery_count: user.delivery_count,
            average_rating,
            review_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_out_of_range_fails_validation() {
        for rating in [0, 6] {
            let body = serde_json::json!({ "deliverMail": "d@x.com", "rating": rating });
            let req: CreateReviewRequest = serde_json::from_value(body).unwrap();
            assert!(req.validate().is_err(), "rating {} accepted", rating);
        }
    }

    #[test]
    fn test_reviewer_email_cannot_be_supplied() {
        let body = serde_json::json!({
            "deliverMail": "d@x.com",
            "rating": 5,
            "reviewerEmail": "someone-else@x.com"
        });
        assert!(serde_json::from_value::<CreateReviewRequest>(body).is_err());
    }
}
