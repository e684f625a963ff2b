use serde::Deserialize;
use validator::Validate;

use crate::model::parcel::{BookingDetails, BookingDetailsPatch, ParcelStatus};

/// Body of `POST /parcels`. The owner comes from the token.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateParcelRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 6, max = 20))]
    pub phone: String,
    #[validate(length(min = 1, max = 50))]
    pub parcel_type: String,
    #[validate(range(exclusive_min = 0.0))]
    pub weight: f64,
    #[validate(length(min = 1, max = 100))]
    pub receiver_name: String,
    #[validate(length(min = 6, max = 20))]
    pub receiver_phone: String,
    #[validate(length(min = 1, max = 300))]
    pub delivery_address: String,
    #[validate(length(min = 1, max = 40))]
    pub requested_delivery_date: String,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
    #[validate(range(min = 0.0))]
    pub price: f64,
}

impl From<CreateParcelRequest> for BookingDetails {
    fn from(req: CreateParcelRequest) -> Self {
        BookingDetails {
            name: req.name,
            phone: req.phone,
            parcel_type: req.parcel_type,
            weight: req.weight,
            receiver_name: req.receiver_name,
            receiver_phone: req.receiver_phone,
            delivery_address: req.delivery_address,
            requested_delivery_date: req.requested_delivery_date,
            latitude: req.latitude,
            longitude: req.longitude,
            price: req.price,
        }
    }
}

/// Body of `PATCH /parcels/update/{id}`; every field is optional.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateParcelRequest {
    pub status: Option<ParcelStatus>,
    #[validate(email)]
    pub assigned: Option<String>,
    #[validate(length(min = 1, max = 40))]
    pub approximate_delivery_date: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 6, max = 20))]
    pub phone: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub parcel_type: Option<String>,
    #[validate(range(exclusive_min = 0.0))]
    pub weight: Option<f64>,
    #[validate(length(min = 1, max = 100))]
    pub receiver_name: Option<String>,
    #[validate(length(min = 6, max = 20))]
    pub receiver_phone: Option<String>,
    #[validate(length(min = 1, max = 300))]
    pub delivery_address: Option<String>,
    #[validate(length(min = 1, max = 40))]
    pub requested_delivery_date: Option<String>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
    #[validate(range(min = 0.0))]
    pub price: Option<f64>,
}

impl UpdateParcelRequest {
    pub fn booking_patch(&self) -> BookingDetailsPatch {
        BookingDetailsPatch {
            name: self.name.clone(),
            phone: self.phone.clone(),
            parcel_type: self.parcel_type.clone(),
            weight: self.weight,
            receiver_name: self.receiver_name.clone(),
            receiver_phone: self.receiver_phone.clone(),
            delivery_address: self.delivery_address.clone(),
            requested_delivery_date: self.requested_delivery_date.clone(),
            latitude: self.latitude,
            longitude: self.longitude,
            price: self.price,
        }
    }
}

/// Query of `GET /parcels`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParcelListQuery {
    pub status: Option<ParcelStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_request_rejects_server_owned_fields() {
        for body in [
            r#"{"deliveredBy":"d@x.com"}"#,
            r#"{"email":"other@x.com"}"#,
            r#"{"bookingDate":"2020-01-01"}"#,
        ] {
            let result: Result<UpdateParcelRequest, _> = serde_json::from_str(body);
            assert!(result.is_err(), "accepted {}", body);
        }
    }

    #[test]
    fn test_update_request_splits_booking_patch() {
        let req: UpdateParcelRequest =
            serde_json::from_str(r#"{"status":"Booked","price":20.0,"receiverName":"R"}"#).unwrap();
        assert_eq!(req.status, Some(ParcelStatus::Booked));
        let patch = req.booking_patch();
        assert_eq!(patch.price, Some(20.0));
        assert_eq!(patch.receiver_name.as_deref(), Some("R"));
        assert!(patch.name.is_none());
    }

    #[test]
    fn test_create_request_validation() {
        let body = serde_json::json!({
            "name": "Sender",
            "phone": "0123456789",
            "parcelType": "Box",
            "weight": 0.0,
            "receiverName": "Receiver",
            "receiverPhone": "0987654321",
            "deliveryAddress": "1 Main St",
            "requestedDeliveryDate": "2024-06-01",
            "latitude": 23.8,
            "longitude": 90.4,
            "price": 150.0
        });
        let req: CreateParcelRequest = serde_json::from_value(body).unwrap();
        assert!(req.validate().is_err());
    }
}
