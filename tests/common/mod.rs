#![allow(dead_code)]

use async_trait::async_trait;
use bson::oid::ObjectId;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use parcel_backend::app::app::AppServices;
use parcel_backend::config::{CookieConfig, JwtConfig};
use parcel_backend::model::parcel::{Parcel, ParcelChanges, ParcelStatus};
use parcel_backend::model::review::{RatingSummary, Review};
use parcel_backend::model::user::{normalize_email, User, UserProfile, UserRole};
use parcel_backend::repository::parcel_repo::ParcelRepository;
use parcel_backend::repository::repository_error::{RepositoryError, RepositoryResult};
use parcel_backend::repository::review_repo::ReviewRepository;
use parcel_backend::repository::user_repo::UserRepository;
use parcel_backend::service::payment_service::{PaymentError, PaymentGateway};
use parcel_backend::util::jwt::{JwtTokenUtils, JwtTokenUtilsImpl, TokenIdentity};

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<Vec<User>>,
    pub fail_increments: AtomicBool,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a user with the given role directly, bypassing the service.
    pub fn seed(&self, email: &str, role: UserRole) -> User {
        let mut user = User::from_profile(
            UserProfile { email: email.to_string(), ..Default::default() },
            0,
        );
        user.id = Some(ObjectId::new());
        user.role = role;
        self.users.lock().unwrap().push(user.clone());
        user
    }

    pub fn get(&self, email: &str) -> Option<User> {
        let email = normalize_email(email);
        self.users.lock().unwrap().iter().find(|u| u.email == email).cloned()
    }

    pub fn count(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    fn update_where<F>(&self, matches: F, apply: impl FnOnce(&mut User)) -> Option<User>
    where
        F: Fn(&User) -> bool,
    {
        let mut users = self.users.lock().unwrap();
        let user = users.iter_mut().find(|u| matches(u))?;
        apply(user);
        Some(user.clone())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn upsert_by_email(
        &self,
        profile: &UserProfile,
        timestamp: i64,
    ) -> RepositoryResult<User> {
        let email = normalize_email(&profile.email);
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.iter_mut().find(|u| u.email == email) {
            if profile.name.is_some() {
                user.name = profile.name.clone();
            }
            if profile.photo.is_some() {
                user.photo = profile.photo.clone();
            }
            if profile.phone.is_some() {
                user.phone = profile.phone.clone();
            }
            user.timestamp = timestamp;
            return Ok(user.clone());
        }
        let mut user = User::from_profile(profile.clone(), timestamp);
        user.id = Some(ObjectId::new());
        users.push(user.clone());
        Ok(user)
    }

    async fn insert(&self, mut user: User) -> RepositoryResult<User> {
        user.email = normalize_email(&user.email);
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == user.email) {
            return Err(RepositoryError::already_exists(format!(
                "User {} already exists",
                user.email
            )));
        }
        user.id = Some(ObjectId::new());
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        Ok(self.get(email))
    }

    async fn find_by_id(&self, id: &ObjectId) -> RepositoryResult<Option<User>> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id.as_ref() == Some(id)).cloned())
    }

    async fn list_all(&self) -> RepositoryResult<Vec<User>> {
        Ok(self.users.lock().unwrap().clone())
    }

    async fn list_by_role(&self, role: UserRole) -> RepositoryResult<Vec<User>> {
        Ok(self.users.lock().unwrap().iter().filter(|u| u.role == role).cloned().collect())
    }

    async fn set_role(&self, id: &ObjectId, role: UserRole) -> RepositoryResult<Option<User>> {
        Ok(self.update_where(|u| u.id.as_ref() == Some(id), |u| {
            u.role = role;
            u.requested_role = None;
        }))
    }

    async fn request_role(
        &self,
        email: &str,
        requested: UserRole,
    ) -> RepositoryResult<Option<User>> {
        let email = normalize_email(email);
        Ok(self.update_where(|u| u.email == email, |u| {
            u.role = UserRole::Requested;
            u.requested_role = Some(requested);
        }))
    }

    async fn increment_delivery_count(&self, email: &str) -> RepositoryResult<()> {
        if self.fail_increments.load(Ordering::SeqCst) {
            return Err(RepositoryError::database("simulated outage"));
        }
        let email = normalize_email(email);
        self.update_where(|u| u.email == email, |u| u.delivery_count += 1)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::not_found(format!("No user found for {}", email)))
    }

    async fn set_delivery_count(&self, email: &str, count: i64) -> RepositoryResult<()> {
        let email = normalize_email(email);
        self.update_where(|u| u.email == email, |u| u.delivery_count = count)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::not_found(format!("No user found for {}", email)))
    }
}

#[derive(Default)]
pub struct InMemoryParcelRepository {
    parcels: Mutex<Vec<Parcel>>,
}

impl InMemoryParcelRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &ObjectId) -> Option<Parcel> {
        self.parcels.lock().unwrap().iter().find(|p| p.id.as_ref() == Some(id)).cloned()
    }

    /// Overwrites a stored status, as a concurrent writer would.
    pub fn force_status(&self, id: &ObjectId, status: ParcelStatus) {
        let mut parcels = self.parcels.lock().unwrap();
        if let Some(parcel) = parcels.iter_mut().find(|p| p.id.as_ref() == Some(id)) {
            parcel.status = status;
        }
    }
}

#[async_trait]
impl ParcelRepository for InMemoryParcelRepository {
    async fn create(&self, mut parcel: Parcel) -> RepositoryResult<Parcel> {
        parcel.id = Some(ObjectId::new());
        parcel.email = normalize_email(&parcel.email);
        self.parcels.lock().unwrap().push(parcel.clone());
        Ok(parcel)
    }

    async fn get_by_id(&self, id: &ObjectId) -> RepositoryResult<Option<Parcel>> {
        Ok(self.get(id))
    }

    async fn list_by_owner(&self, email: &str) -> RepositoryResult<Vec<Parcel>> {
        let email = normalize_email(email);
        Ok(self.parcels.lock().unwrap().iter().filter(|p| p.email == email).cloned().collect())
    }

    async fn list_by_assignee(&self, email: &str) -> RepositoryResult<Vec<Parcel>> {
        let email = normalize_email(email);
        Ok(self
            .parcels
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.assigned.as_deref() == Some(email.as_str()))
            .cloned()
            .collect())
    }

    async fn list_all(&self, status: Option<ParcelStatus>) -> RepositoryResult<Vec<Parcel>> {
        Ok(self
            .parcels
            .lock()
            .unwrap()
            .iter()
            .filter(|p| status.map_or(true, |s| p.status == s))
            .cloned()
            .collect())
    }

    async fn update_if_status(
        &self,
        id: &ObjectId,
        expected: ParcelStatus,
        changes: &ParcelChanges,
    ) -> RepositoryResult<Option<Parcel>> {
        let mut parcels = self.parcels.lock().unwrap();
        let parcel = parcels
            .iter_mut()
            .find(|p| p.id.as_ref() == Some(id) && p.status == expected);
        Ok(parcel.map(|p| {
            changes.apply_to(p);
            p.clone()
        }))
    }

    async fn delivered_counts(&self) -> RepositoryResult<Vec<(String, i64)>> {
        let mut counts: BTreeMap<String, i64> = BTreeMap::new();
        for parcel in self.parcels.lock().unwrap().iter() {
            if parcel.status == ParcelStatus::Delivered {
                if let Some(by) = &parcel.delivered_by {
                    *counts.entry(by.clone()).or_default() += 1;
                }
            }
        }
        Ok(counts.into_iter().collect())
    }
}

#[derive(Default)]
pub struct InMemoryReviewRepository {
    reviews: Mutex<Vec<Review>>,
}

impl InMemoryReviewRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReviewRepository for InMemoryReviewRepository {
    async fn create(&self, mut review: Review) -> RepositoryResult<Review> {
        review.id = Some(ObjectId::new());
        review.deliver_mail = normalize_email(&review.deliver_mail);
        self.reviews.lock().unwrap().push(review.clone());
        Ok(review)
    }

    async fn list_by_delivery_person(&self, email: &str) -> RepositoryResult<Vec<Review>> {
        let email = normalize_email(email);
        Ok(self
            .reviews
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.deliver_mail == email)
            .cloned()
            .collect())
    }

    async fn rating_summaries(&self) -> RepositoryResult<Vec<RatingSummary>> {
        let mut groups: BTreeMap<String, (i64, i64)> = BTreeMap::new();
        for review in self.reviews.lock().unwrap().iter() {
            let entry = groups.entry(review.deliver_mail.clone()).or_default();
            entry.0 += i64::from(review.rating);
            entry.1 += 1;
        }
        Ok(groups
            .into_iter()
            .map(|(deliver_mail, (total, count))| RatingSummary { deliver_mail, total, count })
            .collect())
    }
}

/// Records requests and answers with a fixed client secret, or fails when `fail` is set.
#[derive(Default)]
pub struct FakePaymentGateway {
    pub calls: Mutex<Vec<(i64, String)>>,
    pub fail: AtomicBool,
}

impl FakePaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<(i64, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for FakePaymentGateway {
    async fn create_intent(
        &self,
        amount_minor: i64,
        currency: &str,
    ) -> Result<String, PaymentError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PaymentError::Provider {
                status: 402,
                message: "card declined".to_string(),
            });
        }
        self.calls.lock().unwrap().push((amount_minor, currency.to_string()));
        Ok(format!("pi_test_{}_secret_abc", amount_minor))
    }
}

/// In-memory stores plus the services wired on top of them.
pub struct TestContext {
    pub users: Arc<InMemoryUserRepository>,
    pub parcels: Arc<InMemoryParcelRepository>,
    pub reviews: Arc<InMemoryReviewRepository>,
    pub gateway: Arc<FakePaymentGateway>,
    pub jwt: Arc<JwtTokenUtilsImpl>,
    pub services: AppServices,
}

impl TestContext {
    pub fn new() -> Self {
        let users = Arc::new(InMemoryUserRepository::new());
        let parcels = Arc::new(InMemoryParcelRepository::new());
        let reviews = Arc::new(InMemoryReviewRepository::new());
        let gateway = Arc::new(FakePaymentGateway::new());
        let jwt = Arc::new(JwtTokenUtilsImpl::new(JwtConfig::default()));
        let services = AppServices::new(
            users.clone(),
            parcels.clone(),
            reviews.clone(),
            gateway.clone(),
            jwt.clone(),
            CookieConfig::default(),
            "usd".to_string(),
        );
        TestContext { users, parcels, reviews, gateway, jwt, services }
    }

    /// `Cookie` header value carrying a fresh token for `email`.
    pub fn cookie_for(&self, email: &str) -> String {
        let token = self
            .jwt
            .issue_token(&TokenIdentity { email: email.to_string(), name: None })
            .unwrap();
        format!("token={}", token)
    }

    pub fn claims_for(&self, email: &str) -> parcel_backend::util::jwt::Claims {
        let token = self
            .jwt
            .issue_token(&TokenIdentity { email: email.to_string(), name: None })
            .unwrap();
        self.jwt.validate_token(&token).unwrap()
    }
}

pub fn booking() -> parcel_backend::model::parcel::BookingDetails {
    parcel_backend::model::parcel::BookingDetails {
        name: "Sender".to_string(),
        phone: "0123456789".to_string(),
        parcel_type: "Box".to_string(),
        weight: 2.5,
        receiver_name: "Receiver".to_string(),
        receiver_phone: "0987654321".to_string(),
        delivery_address: "1 Main St".to_string(),
        requested_delivery_date: "2024-06-01".to_string(),
        latitude: 23.8,
        longitude: 90.4,
        price: 150.0,
    }
}

pub fn booking_json() -> serde_json::Value {
    serde_json::json!({
        "name": "Sender",
        "phone": "0123456789",
        "parcelType": "Box",
        "weight": 2.5,
        "receiverName": "Receiver",
        "receiverPhone": "0987654321",
        "deliveryAddress": "1 Main St",
        "requestedDeliveryDate": "2024-06-01",
        "latitude": 23.8,
        "longitude": 90.4,
        "price": 150.0
    })
}
