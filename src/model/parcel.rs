use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a parcel.
///
/// Forward order is `Pending -> Booked -> InTransit -> Delivered`; any
/// non-terminal state may also move to `Cancelled`. `Delivered` and
/// `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ParcelStatus {
    #[default]
    Pending,
    Booked,
    InTransit,
    Delivered,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("parcel is {0} and can no longer change")]
    Terminal(ParcelStatus),
    #[error("parcel cannot move back from {from} to {to}")]
    Backward { from: ParcelStatus, to: ParcelStatus },
}

impl ParcelStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParcelStatus::Pending => "Pending",
            ParcelStatus::Booked => "Booked",
            ParcelStatus::InTransit => "InTransit",
            ParcelStatus::Delivered => "Delivered",
            ParcelStatus::Cancelled => "Cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ParcelStatus::Delivered | ParcelStatus::Cancelled)
    }

    fn rank(&self) -> u8 {
        match self {
            ParcelStatus::Pending => 0,
            ParcelStatus::Booked => 1,
            ParcelStatus::InTransit => 2,
            ParcelStatus::Delivered => 3,
            ParcelStatus::Cancelled => u8::MAX,
        }
    }

    /// Checks a move from `self` to `next` and returns the resulting status.
    ///
    /// Staying in a non-terminal state is allowed (field-only updates), and a
    /// repeated `Delivered` is accepted so callers can treat it as a no-op.
    pub fn transition_to(self, next: ParcelStatus) -> Result<ParcelStatus, TransitionError> {
        match (self, next) {
            (ParcelStatus::Delivered, ParcelStatus::Delivered) => Ok(next),
            (current, _) if current.is_terminal() => Err(TransitionError::Terminal(current)),
            (_, ParcelStatus::Cancelled) => Ok(next),
            (current, next) if next.rank() >= current.rank() => Ok(next),
            (from, to) => Err(TransitionError::Backward { from, to }),
        }
    }
}

impl fmt::Display for ParcelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the customer fills in when booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDetails {
    pub name: String,
    pub phone: String,
    pub parcel_type: String,
    pub weight: f64,
    pub receiver_name: String,
    pub receiver_phone: String,
    pub delivery_address: String,
    pub requested_delivery_date: String,
    pub latitude: f64,
    pub longitude: f64,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parcel {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// Owner (booker) email.
    pub email: String,
    #[serde(flatten)]
    pub details: BookingDetails,
    /// Email of the assigned delivery person.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approximate_delivery_date: Option<String>,
    #[serde(default)]
    pub status: ParcelStatus,
    /// Who marked the parcel delivered; the source for delivery-count reconciliation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivered_by: Option<String>,
    pub booking_date: String,
    pub updated_at: String,
}

impl Parcel {
    pub fn new(owner_email: String, details: BookingDetails, now: String) -> Self {
        Parcel {
            id: None,
            email: owner_email,
            details,
            assigned: None,
            approximate_delivery_date: None,
            status: ParcelStatus::Pending,
            delivered_by: None,
            booking_date: now.clone(),
            updated_at: now,
        }
    }
}

/// Partial booking details; only the present fields are written.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDetailsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parcel_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receiver_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receiver_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_delivery_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

impl BookingDetailsPatch {
    pub fn is_empty(&self) -> bool {
        *self == BookingDetailsPatch::default()
    }

    pub fn apply_to(&self, details: &mut BookingDetails) {
        if let Some(v) = &self.name {
            details.name.clone_from(v);
        }
        if let Some(v) = &self.phone {
            details.phone.clone_from(v);
        }
        if let Some(v) = &self.parcel_type {
            details.parcel_type.clone_from(v);
        }
        if let Some(v) = self.weight {
            details.weight = v;
        }
        if let Some(v) = &self.receiver_name {
            details.receiver_name.clone_from(v);
        }
        if let Some(v) = &self.receiver_phone {
            details.receiver_phone.clone_from(v);
        }
        if let Some(v) = &self.delivery_address {
            details.delivery_address.clone_from(v);
        }
        if let Some(v) = &self.requested_delivery_date {
            details.requested_delivery_date.clone_from(v);
        }
        if let Some(v) = self.latitude {
            details.latitude = v;
        }
        if let Some(v) = self.longitude {
            details.longitude = v;
        }
        if let Some(v) = self.price {
            details.price = v;
        }
    }
}

/// The `$set` part of a parcel update, already checked against the state machine.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParcelChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ParcelStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approximate_delivery_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivered_by: Option<String>,
    #[serde(flatten)]
    pub details: BookingDetailsPatch,
    pub updated_at: String,
}

impl ParcelChanges {
    /// Applies the changes to an in-memory copy, mirroring the store's `$set`.
    pub fn apply_to(&self, parcel: &mut Parcel) {
        if let Some(status) = self.status {
            parcel.status = status;
        }
        if let Some(assigned) = &self.assigned {
            parcel.assigned = Some(assigned.clone());
        }
        if let Some(date) = &self.approximate_delivery_date {
            parcel.approximate_delivery_date = Some(date.clone());
        }
        if let Some(by) = &self.delivered_by {
            parcel.delivered_by = Some(by.clone());
        }
        self.details.apply_to(&mut parcel.details);
        parcel.updated_at = self.updated_at.clone();
    }
}
