use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum UserRole {
    #[default]
    #[serde(rename = "user")]
    User,
    #[serde(rename = "admin")]
    Admin,
    #[serde(rename = "deliveryMan")]
    DeliveryMan,
    /// A role change was requested and awaits an administrator.
    #[serde(rename = "Requested")]
    Requested,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Admin => "admin",
            UserRole::DeliveryMan => "deliveryMan",
            UserRole::Requested => "Requested",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_role: Option<UserRole>,
    #[serde(default)]
    pub delivery_count: i64,
    /// Milliseconds since the epoch of the last registration write.
    #[serde(default)]
    pub timestamp: i64,
}

/// Client-editable part of a user record, merged in on registration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserProfile {
    pub email: String,
    pub name: Option<String>,
    pub photo: Option<String>,
    pub phone: Option<String>,
}

impl User {
    /// A fresh `user`-role record built from a registration profile.
    pub fn from_profile(profile: UserProfile, timestamp: i64) -> Self {
        User {
            id: None,
            email: normalize_email(&profile.email),
            name: profile.name,
            photo: profile.photo,
            phone: profile.phone,
            role: UserRole::User,
            requested_role: None,
            delivery_count: 0,
            timestamp,
        }
    }
}

/// Emails are stored and looked up trimmed and lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
