use async_trait::async_trait;
use bson::oid::ObjectId;
use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::dto::parcel_dto::UpdateParcelRequest;
use crate::model::parcel::{BookingDetails, Parcel, ParcelChanges, ParcelStatus};
use crate::model::user::{normalize_email, UserRole};
use crate::repository::parcel_repo::ParcelRepository;
use crate::repository::repository_error::RepositoryError;
use crate::repository::user_repo::UserRepository;
use crate::util::error::ServiceError;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    /// Delivery people whose stored count was rewritten.
    pub users_updated: usize,
    /// Delivered parcels whose deliverer no longer has a user record.
    pub unknown_deliverers: Vec<String>,
}

#[async_trait]
pub trait ParcelService: Send + Sync {
    async fn create(&self, owner_email: &str, details: BookingDetails)
        -> Result<Parcel, ServiceError>;
    /// Parcels booked by `owner_email`; visible to that owner and to administrators.
    async fn list_by_owner(
        &self,
        caller_email: &str,
        owner_email: &str,
    ) -> Result<Vec<Parcel>, ServiceError>;
    async fn list_by_assignee(&self, assignee_email: &str) -> Result<Vec<Parcel>, ServiceError>;
    async fn list_all(&self, status: Option<ParcelStatus>) -> Result<Vec<Parcel>, ServiceError>;
    /// Applies a checked field merge.
    /// Moving to `Delivered` credits the caller's delivery count once.
    async fn update_status(
        &self,
        id: &str,
        update: UpdateParcelRequest,
        acting_email: &str,
    ) -> Result<Parcel, ServiceError>;
    async fn cancel(&self, id: &str, acting_email: &str) -> Result<Parcel, ServiceError>;
    /// Rewrites every delivery count from the delivered parcels on record.
    async fn reconcile_delivery_counts(&self) -> Result<ReconcileReport, ServiceError>;
}

pub struct ParcelServiceImpl {
    pub parcel_repo: Arc<dyn ParcelRepository>,
    pub user_repo: Arc<dyn UserRepository>,
}

/// How the caller relates to one parcel.
#[derive(Debug, Clone, Copy)]
struct Access {
    admin: bool,
    owner: bool,
    assignee: bool,
}

impl ParcelServiceImpl {
    pub fn new(parcel_repo: Arc<dyn ParcelRepository>, user_repo: Arc<dyn UserRepository>) -> Self {
        Self { parcel_repo, user_repo }
    }

    /// Parcels can only be handed to an existing delivery person.
    async fn require_delivery_man(&self, email: &str) -> Result<(), ServiceError> {
        let user = self.user_repo.find_by_email(email).await?;
        if !matches!(&user, Some(user) if user.role == UserRole::DeliveryMan) {
            warn!(assignee = %email, "Assignee is not a delivery person");
            return Err(ServiceError::InvalidInput(format!("{} is not a delivery person", email)));
        }
        Ok(())
    }

    async fn load(&self, id: &str) -> Result<(ObjectId, Parcel), ServiceError> {
        let object_id = ObjectId::parse_str(id)
            .map_err(|_| ServiceError::InvalidInput(format!("Invalid parcel id: {}", id)))?;
        let parcel = self
            .parcel_repo
            .get_by_id(&object_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("No parcel with id {}", id)))?;
        Ok((object_id, parcel))
    }

    async fn is_admin(&self, email: &str) -> Result<bool, ServiceError> {
        let user = self.user_repo.find_by_email(email).await?;
        Ok(matches!(user, Some(u) if u.role == UserRole::Admin))
    }

    async fn access(&self, parcel: &Parcel, caller: &str) -> Result<Access, ServiceError> {
        Ok(Access {
            admin: self.is_admin(caller).await?,
            owner: parcel.email == caller,
            assignee: parcel.assigned.as_deref() == Some(caller),
        })
    }

    async fn write(
        &self,
        id: &ObjectId,
        expected: ParcelStatus,
        changes: &ParcelChanges,
    ) -> Result<Parcel, ServiceError> {
        self.parcel_repo
            .update_if_status(id, expected, changes)
            .await?
            .ok_or_else(|| {
                warn!("Parcel changed between read and write");
                ServiceError::Conflict(format!("Parcel {} was modified concurrently, retry", id))
            })
    }
}

fn now() -> String {
    Utc::now().to_rfc3339()
}

#[async_trait]
impl ParcelService for ParcelServiceImpl {
    #[instrument(skip(self, details), fields(owner = %owner_email))]
    async fn create(
        &self,
        owner_email: &str,
        details: BookingDetails,
    ) -> Result<Parcel, ServiceError> {
        let owner = normalize_email(owner_email);
        if owner.is_empty() {
            return Err(ServiceError::InvalidInput("owner email is required".to_string()));
        }
        let parcel = self.parcel_repo.create(Parcel::new(owner, details, now())).await?;
        info!("Parcel booked");
        Ok(parcel)
    }

    #[instrument(skip(self))]
    async fn list_by_owner(
        &self,
        caller_email: &str,
        owner_email: &str,
    ) -> Result<Vec<Parcel>, ServiceError> {
        let caller = normalize_email(caller_email);
        let owner = normalize_email(owner_email);
        if caller != owner && !self.is_admin(&caller).await? {
            warn!("Caller tried to list parcels of another user");
            return Err(ServiceError::Forbidden(
                "Parcels of other users are not visible".to_string(),
            ));
        }
        Ok(self.parcel_repo.list_by_owner(&owner).await?)
    }

    #[instrument(skip(self))]
    async fn list_by_assignee(&self, assignee_email: &str) -> Result<Vec<Parcel>, ServiceError> {
        Ok(self.parcel_repo.list_by_assignee(assignee_email).await?)
    }

    #[instrument(skip(self))]
    async fn list_all(&self, status: Option<ParcelStatus>) -> Result<Vec<Parcel>, ServiceError> {
        Ok(self.parcel_repo.list_all(status).await?)
    }

    #[instrument(
        skip(self, update),
        fields(id = %id, acting = %acting_email, status = ?update.status)
    )]
    async fn update_status(
        &self,
        id: &str,
        update: UpdateParcelRequest,
        acting_email: &str,
    ) -> Result<Parcel, ServiceError> {
        let caller = normalize_email(acting_email);
        let (object_id, parcel) = self.load(id).await?;
        let access = self.access(&parcel, &caller).await?;
        if !(access.admin || access.owner || access.assignee) {
            return Err(ServiceError::Forbidden("Not allowed to update this parcel".to_string()));
        }

        let patch = update.booking_patch();
        let assigned = update.assigned.as_deref().map(normalize_email);
        let has_field_changes =
            assigned.is_some() || update.approximate_delivery_date.is_some() || !patch.is_empty();
        if update.status.is_none() && !has_field_changes {
            return Err(ServiceError::InvalidInput("Nothing to update".to_string()));
        }

        // A repeated Delivered is acknowledged without touching the store or the count.
        if parcel.status == ParcelStatus::Delivered
            && update.status == Some(ParcelStatus::Delivered)
            && !has_field_changes
        {
            debug!("Parcel already delivered, nothing to do");
            return Ok(parcel);
        }
        if parcel.status.is_terminal() {
            return Err(ServiceError::TerminalState(format!(
                "Parcel is {} and can no longer change",
                parcel.status
            )));
        }
        let next = parcel.status.transition_to(update.status.unwrap_or(parcel.status))?;

        if (assigned.is_some() || update.approximate_delivery_date.is_some()) && !access.admin {
            return Err(ServiceError::Forbidden("Only an admin can assign parcels".to_string()));
        }
        if let Some(assignee) = assigned.as_deref() {
            self.require_delivery_man(assignee).await?;
        }
        if !patch.is_empty() && !access.admin {
            if !access.owner {
                return Err(ServiceError::Forbidden(
                    "Only the owner can edit booking details".to_string(),
                ));
            }
            if parcel.status != ParcelStatus::Pending {
                return Err(ServiceError::InvalidInput(
                    "Booking details can only be edited while the parcel is Pending".to_string(),
                ));
            }
        }
        if next == ParcelStatus::Cancelled && !(access.admin || access.owner) {
            return Err(ServiceError::Forbidden(
                "Only the owner or an admin can cancel".to_string(),
            ));
        }

        let delivering = next == ParcelStatus::Delivered;
        if delivering {
            let effective_assignee = assigned.as_deref().or(parcel.assigned.as_deref());
            if effective_assignee != Some(caller.as_str()) {
                return Err(ServiceError::Forbidden(
                    "Only the assigned delivery person can mark a parcel Delivered".to_string(),
                ));
            }
        }

        let changes = ParcelChanges {
            status: update.status.map(|_| next),
            assigned,
            approximate_delivery_date: update.approximate_delivery_date.clone(),
            delivered_by: delivering.then(|| caller.clone()),
            details: patch,
            updated_at: now(),
        };
        let updated = self.write(&object_id, parcel.status, &changes).await?;
        info!(from = %parcel.status, to = %updated.status, "Parcel updated");

        if delivering {
            // Best effort: a failure here leaves the count behind until the next reconciliation.
            match self.user_repo.increment_delivery_count(&caller).await {
                Ok(()) => info!("Delivery count incremented"),
                Err(e) => warn!("Failed to increment delivery count for {}: {}", caller, e),
            }
        }
        Ok(updated)
    }

    #[instrument(skip(self), fields(id = %id, acting = %acting_email))]
    async fn cancel(&self, id: &str, acting_email: &str) -> Result<Parcel, ServiceError> {
        let caller = normalize_email(acting_email);
        let (object_id, parcel) = self.load(id).await?;
        let access = self.access(&parcel, &caller).await?;
        if !(access.admin || access.owner) {
            return Err(ServiceError::Forbidden(
                "Only the owner or an admin can cancel".to_string(),
            ));
        }

        let next = parcel.status.transition_to(ParcelStatus::Cancelled)?;
        let changes = ParcelChanges {
            status: Some(next),
            updated_at: now(),
            ..Default::default()
        };
        let cancelled = self.write(&object_id, parcel.status, &changes).await?;
        info!(from = %parcel.status, "Parcel cancelled");
        Ok(cancelled)
    }

    #[instrument(skip(self))]
    async fn reconcile_delivery_counts(&self) -> Result<ReconcileReport, ServiceError> {
        let mut counts: BTreeMap<String, i64> = self
            .user_repo
            .list_by_role(UserRole::DeliveryMan)
            .await?
            .into_iter()
            .map(|user| (user.email, 0))
            .collect();
        for (email, delivered) in self.parcel_repo.delivered_counts().await? {
            counts.insert(normalize_email(&email), delivered);
        }

        let mut report = ReconcileReport { users_updated: 0, unknown_deliverers: Vec::new() };
        for (email, count) in counts {
            match self.user_repo.set_delivery_count(&email, count).await {
                Ok(()) => report.users_updated += 1,
                Err(RepositoryError::NotFound(_)) => {
                    warn!("Delivered parcels reference unknown user {}", email);
                    report.unknown_deliverers.push(email);
                }
                Err(e) => return Err(e.into()),
            }
        }
        info!(users_updated = report.users_updated, "Delivery counts reconciled");
        Ok(report)
    }
}
