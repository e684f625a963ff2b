use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// Email of the delivery person being reviewed.
    pub deliver_mail: String,
    pub rating: u8,
    #[serde(default)]
    pub feedback: String,
    pub reviewer_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewer_photo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parcel_id: Option<String>,
    pub created_at: String,
}

/// Rating totals of one delivery person, as grouped by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingSummary {
    pub deliver_mail: String,
    pub total: i64,
    pub count: i64,
}

impl RatingSummary {
    pub fn average(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        round_one_decimal(self.total as f64 / self.count as f64)
    }
}

/// Mean rating rounded to one decimal; `0` when there are no reviews.
pub fn average_rating(reviews: &[Review]) -> f64 {
    if reviews.is_empty() {
        return 0.0;
    }
    let total: u64 = reviews.iter().map(|r| u64::from(r.rating)).sum();
    round_one_decimal(total as f64 / reviews.len() as f64)
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(rating: u8) -> Review {
        Review {
            id: None,
            deliver_mail: "d@x.com".to_string(),
            rating,
            feedback: String::new(),
            reviewer_email: "u@x.com".to_string(),
            reviewer_name: None,
            reviewer_photo: None,
            parcel_id: None,
            created_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_average_of_no_reviews_is_zero() {
        assert_eq!(average_rating(&[]), 0.0);
    }

    #[test]
    fn test_average_rating() {
        assert_eq!(average_rating(&[review(3), review(5)]), 4.0);
        assert_eq!(average_rating(&[review(4), review(4), review(5)]), 4.3);
    }

    #[test]
    fn test_summary_average() {
        let summary = RatingSummary { deliver_mail: "d@x.com".to_string(), total: 11, count: 3 };
        assert_eq!(summary.average(), 3.7);
        let empty = RatingSummary { deliver_mail: "d@x.com".to_string(), total: 0, count: 0 };
        assert_eq!(empty.average(), 0.0);
    }
}
