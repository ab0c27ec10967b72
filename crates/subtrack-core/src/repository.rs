//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Subscription operations take the
//! caller's identity and are responsible for ownership filtering; the
//! HTTP layer never filters records itself.

use uuid::Uuid;

use crate::error::SubtrackResult;
use crate::models::{
    principal::Principal,
    subscription::{CreateSubscription, Subscription, SubscriptionWithOwner, UpdateSubscription},
    user::{CreateUser, UpdateUser, User},
};

pub trait UserRepository: Send + Sync {
    /// Fails with `AlreadyExists` when the (normalised) email is taken.
    fn create(&self, input: CreateUser) -> impl Future<Output = SubtrackResult<User>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = SubtrackResult<User>> + Send;
    /// Case-insensitive lookup.
    fn get_by_email(&self, email: &str) -> impl Future<Output = SubtrackResult<User>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateUser,
    ) -> impl Future<Output = SubtrackResult<User>> + Send;
    /// Every user, oldest first.
    fn list(&self) -> impl Future<Output = SubtrackResult<Vec<User>>> + Send;
}

pub trait SubscriptionRepository: Send + Sync {
    /// Validates the input, then persists it owned by `owner_id`.
    fn create(
        &self,
        owner_id: Uuid,
        input: CreateSubscription,
    ) -> impl Future<Output = SubtrackResult<Subscription>> + Send;

    /// `NotFound` when the record is missing or the requester is neither
    /// its owner nor an admin. Both cases are indistinguishable.
    fn get(
        &self,
        id: Uuid,
        requester: &Principal,
    ) -> impl Future<Output = SubtrackResult<Subscription>> + Send;

    fn list_for_owner(
        &self,
        owner_id: Uuid,
    ) -> impl Future<Output = SubtrackResult<Vec<Subscription>>> + Send;

    /// Every subscription with its owner's name and email. Admin only;
    /// callers check the role before calling.
    fn list_all(&self) -> impl Future<Output = SubtrackResult<Vec<SubscriptionWithOwner>>> + Send;

    /// Owner only. `NotFound` for anybody else, `Validation` once the
    /// record is cancelled.
    fn update(
        &self,
        id: Uuid,
        requester_id: Uuid,
        input: UpdateSubscription,
    ) -> impl Future<Output = SubtrackResult<Subscription>> + Send;

    /// Owner only. Moves the record to `cancelled`; repeating it is a
    /// no-op.
    fn cancel(
        &self,
        id: Uuid,
        requester_id: Uuid,
    ) -> impl Future<Output = SubtrackResult<()>> + Send;
}
