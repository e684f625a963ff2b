use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::model::user::{UserProfile, UserRole};
use crate::util::jwt::TokenIdentity;

/// Body of `POST /jwt`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct IssueTokenRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(max = 100))]
    pub name: Option<String>,
}

impl From<IssueTokenRequest> for TokenIdentity {
    fn from(req: IssueTokenRequest) -> Self {
        TokenIdentity { email: req.email, name: req.name }
    }
}

/// Body of `PUT /users` and `POST /users`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct RegisterUserRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(url)]
    pub photo: Option<String>,
    #[validate(length(min = 6, max = 20))]
    pub phone: Option<String>,
}

impl From<RegisterUserRequest> for UserProfile {
    fn from(req: RegisterUserRequest) -> Self {
        UserProfile {
            email: req.email,
            name: req.name,
            photo: req.photo,
            phone: req.phone,
        }
    }
}

/// Body of `PATCH /users/update/{id}`. A missing role is rejected by the service.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateRoleRequest {
    pub role: Option<UserRole>,
}

/// Body of `PATCH /users/request-role`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct RoleChangeRequest {
    pub role: UserRole,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok<T: Into<String>>(message: T) -> Self {
        MessageResponse { success: true, message: message.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_rejects_unknown_fields() {
        let result: Result<RegisterUserRequest, _> =
            serde_json::from_str(r#"{"email":"u@x.com","role":"admin"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_register_request_validation() {
        let req: RegisterUserRequest = serde_json::from_str(r#"{"email":"not-an-email"}"#).unwrap();
        assert!(req.validate().is_err());

        let req: RegisterUserRequest = serde_json::from_str(
            r#"{"email":"u@x.com","name":"U","photo":"https://img.example/u.png"}"#,
        )
        .unwrap();
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_update_role_accepts_missing_role() {
        let req: UpdateRoleRequest = serde_json::from_str("{}").unwrap();
        assert!(req.role.is_none());
        let req: UpdateRoleRequest = serde_json::from_str(r#"{"role":"deliveryMan"}"#).unwrap();
        assert_eq!(req.role, Some(UserRole::DeliveryMan));
    }
}
