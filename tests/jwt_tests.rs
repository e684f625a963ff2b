use parcel_backend::config::JwtConfig;
use parcel_backend::util::jwt::*;
use chrono::Utc;

fn create_test_jwt_utils() -> JwtTokenUtilsImpl {
    JwtTokenUtilsImpl::new(JwtConfig::default())
}

fn identity(email: &str) -> TokenIdentity {
    TokenIdentity {
        email: email.to_string(),
        name: Some("Test User".to_string()),
    }
}

#[test]
fn test_jwt_utils_creation() {
    let jwt_utils = create_test_jwt_utils();
    assert!(!jwt_utils.jwt_config.jwt_secret.is_empty());
    assert_eq!(jwt_utils.token_lifetime_secs(), 12 * 60 * 60);
}

#[test]
fn test_issue_token_success() {
    let jwt_utils = create_test_jwt_utils();

    let token = jwt_utils.issue_token(&identity("user@example.com")).unwrap();
    assert!(!token.is_empty());
    assert_eq!(token.split('.').count(), 3);

    let claims = jwt_utils.validate_token(&token).unwrap();
    assert_eq!(claims.email, "user@example.com");
    assert_eq!(claims.sub, "user@example.com");
    assert_eq!(claims.name.as_deref(), Some("Test User"));
    assert_eq!(claims.iss.as_deref(), Some("parcel-backend-test"));
}

#[test]
fn test_issued_email_is_normalized() {
    let jwt_utils = create_test_jwt_utils();
    let token = jwt_utils.issue_token(&identity("  Mixed@Example.COM ")).unwrap();
    let claims = jwt_utils.validate_token(&token).unwrap();
    assert_eq!(claims.email, "mixed@example.com");
}

#[test]
fn test_issue_token_requires_email() {
    let jwt_utils = create_test_jwt_utils();
    let result = jwt_utils.issue_token(&identity("   "));
    assert!(matches!(result, Err(JwtError::EncodingFailed(_))));
}

#[test]
fn test_token_expiration_window() {
    let jwt_utils = create_test_jwt_utils();
    let before = Utc::now().timestamp();
    let token = jwt_utils.issue_token(&identity("user@example.com")).unwrap();
    let claims = jwt_utils.validate_token(&token).unwrap();

    let lifetime = claims.exp - claims.iat;
    assert_eq!(lifetime, jwt_utils.token_lifetime_secs());
    assert!(claims.iat >= before);
}

#[test]
fn test_tokens_are_unique() {
    let jwt_utils = create_test_jwt_utils();
    let first = jwt_utils.issue_token(&identity("user@example.com")).unwrap();
    let second = jwt_utils.issue_token(&identity("user@example.com")).unwrap();
    assert_ne!(first, second);

    let first_claims = jwt_utils.validate_token(&first).unwrap();
    let second_claims = jwt_utils.validate_token(&second).unwrap();
    assert_ne!(first_claims.jti, second_claims.jti);
}

#[test]
fn test_expired_token_rejected() {
    let jwt_utils = create_test_jwt_utils();
    let token = jwt_utils
        .issue_token_expiring_in(&identity("user@example.com"), -5)
        .unwrap();
    let result = jwt_utils.validate_token(&token);
    assert!(matches!(result, Err(JwtError::TokenExpired)));
}

#[test]
fn test_malformed_token_rejected() {
    let jwt_utils = create_test_jwt_utils();
    for token in ["", "not-a-token", "a.b.c"] {
        let result = jwt_utils.validate_token(token);
        assert!(matches!(result, Err(JwtError::DecodingFailed(_))), "token {:?}", token);
    }
}

#[test]
fn test_tampered_token_rejected() {
    let jwt_utils = create_test_jwt_utils();
    let token = jwt_utils.issue_token(&identity("user@example.com")).unwrap();
    let mut tampered = token.clone();
    tampered.pop();
    tampered.push(if token.ends_with('A') { 'B' } else { 'A' });
    assert!(jwt_utils.validate_token(&tampered).is_err());
}

#[test]
fn test_token_from_other_secret_rejected() {
    let jwt_utils = create_test_jwt_utils();
    let mut other_config = JwtConfig::default();
    other_config.jwt_secret = "another_secret_key_that_is_also_long_enough_for_hs256".to_string();
    let other = JwtTokenUtilsImpl::new(other_config);

    let token = other.issue_token(&identity("user@example.com")).unwrap();
    assert!(jwt_utils.validate_token(&token).is_err());
}

#[test]
fn test_wrong_issuer_rejected() {
    let jwt_utils = create_test_jwt_utils();
    let mut other_config = JwtConfig::default();
    other_config.jwt_issuer = Some("somebody-else".to_string());
    let other = JwtTokenUtilsImpl::new(other_config);

    let token = other.issue_token(&identity("user@example.com")).unwrap();
    assert!(jwt_utils.validate_token(&token).is_err());
}
