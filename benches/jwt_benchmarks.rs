use axum::http::{header, HeaderMap, HeaderValue};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use parcel_backend::config::JwtConfig;
use parcel_backend::middlewares::auth_middleware::find_token;
use parcel_backend::util::jwt::{JwtTokenUtils, JwtTokenUtilsImpl, TokenIdentity};

fn create_bench_jwt_utils() -> JwtTokenUtilsImpl {
    JwtTokenUtilsImpl::new(JwtConfig {
        jwt_secret: "bench_secret_key_for_testing_purposes_only_very_long_key_that_ensures_security".to_string(),
        token_expiration: 720,
        jwt_issuer: Some("parcel-backend-bench".to_string()),
    })
}

fn identity() -> TokenIdentity {
    TokenIdentity {
        email: "user@example.com".to_string(),
        name: Some("Bench User".to_string()),
    }
}

fn bench_issue_token(c: &mut Criterion) {
    let jwt_utils = create_bench_jwt_utils();
    let identity = identity();
    c.bench_function("issue_token", |b| {
        b.iter(|| jwt_utils.issue_token(black_box(&identity)))
    });
}

fn bench_validate_token(c: &mut Criterion) {
    let jwt_utils = create_bench_jwt_utils();
    let token = jwt_utils.issue_token(&identity()).unwrap();
    c.bench_function("validate_token", |b| {
        b.iter(|| jwt_utils.validate_token(black_box(&token)))
    });
}

/// Cookie parsing plus validation, as done by the auth middleware on every request.
fn bench_cookie_round_trip(c: &mut Criterion) {
    let jwt_utils = create_bench_jwt_utils();
    let token = jwt_utils.issue_token(&identity()).unwrap();
    let mut headers = HeaderMap::new();
    let cookie_header = format!("theme=dark; token={}; lang=en", token);
    headers.insert(header::COOKIE, HeaderValue::from_str(&cookie_header).unwrap());
    c.bench_function("cookie_extract_and_validate", |b| {
        b.iter(|| {
            let token = find_token(black_box(&headers)).unwrap();
            jwt_utils.validate_token(&token)
        })
    });
}

criterion_group!(benches, bench_issue_token, bench_validate_token, bench_cookie_round_trip);
criterion_main!(benches);
