//! SurrealDB implementation of [`SubscriptionRepository`].
//!
//! Ownership is enforced here: every owner-scoped statement carries an
//! `owner_id = $owner_id` guard, and records belonging to someone else
//! are reported as missing.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use subtrack_core::error::{SubtrackError, SubtrackResult};
use subtrack_core::models::principal::Principal;
use subtrack_core::models::subscription::{
    BillingCycle, CreateSubscription, OwnerSummary, Subscription, SubscriptionStatus,
    SubscriptionWithOwner, UpdateSubscription,
};
use subtrack_core::repository::SubscriptionRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbError;

const ENTITY: &str = "subscription";

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct SubscriptionRow {
    owner_id: String,
    name: String,
    description: String,
    category: String,
    amount: f64,
    currency: String,
    billing_cycle: String,
    next_billing_date: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct SubscriptionRowWithId {
    record_id: String,
    owner_id: String,
    name: String,
    description: String,
    category: String,
    amount: f64,
    currency: String,
    billing_cycle: String,
    next_billing_date: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct OwnerRow {
    record_id: String,
    name: String,
    email: String,
}

fn parse_uuid(s: &str, what: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(s).map_err(|e| DbError::Decode(format!("invalid {what} UUID: {e}")))
}

impl SubscriptionRow {
    fn into_subscription(self, id: Uuid) -> Result<Subscription, DbError> {
        Ok(Subscription {
            id,
            owner_id: parse_uuid(&self.owner_id, "owner")?,
            name: self.name,
            description: self.description,
            category: self.category,
            amount: self.amount,
            currency: self.currency,
            billing_cycle: BillingCycle::from_str(&self.billing_cycle).map_err(|_| {
                DbError::Decode(format!("unknown billing cycle: {}", self.billing_cycle))
            })?,
            next_billing_date: NaiveDate::from_str(&self.next_billing_date)
                .map_err(|e| DbError::Decode(format!("invalid billing date: {e}")))?,
            status: SubscriptionStatus::from_str(&self.status)
                .map_err(|_| DbError::Decode(format!("unknown status: {}", self.status)))?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl SubscriptionRowWithId {
    fn try_into_subscription(self) -> Result<Subscription, DbError> {
        let id = parse_uuid(&self.record_id, "subscription")?;
        SubscriptionRow {
            owner_id: self.owner_id,
            name: self.name,
            description: self.description,
            category: self.category,
            amount: self.amount,
            currency: self.currency,
            billing_cycle: self.billing_cycle,
            next_billing_date: self.next_billing_date,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_subscription(id)
    }
}

fn not_found(id: Uuid) -> DbError {
    DbError::NotFound {
        entity: ENTITY.into(),
        id: id.to_string(),
    }
}

/// SurrealDB implementation of the Subscription repository.
#[derive(Clone)]
pub struct SurrealSubscriptionRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSubscriptionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// Unscoped lookup; callers apply the ownership rule.
    async fn fetch(&self, id: Uuid) -> Result<Subscription, DbError> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('subscription', $id)")
            .bind(("id", id.to_string()))
            .await?;

        let rows: Vec<SubscriptionRow> = result.take(0)?;
        let row = rows.into_iter().next().ok_or_else(|| not_found(id))?;
        row.into_subscription(id)
    }

    /// Lookup for mutations: only the owner may change a record, and to
    /// everyone else it does not exist. Admins get no exemption here.
    async fn fetch_owned(&self, id: Uuid, requester_id: Uuid) -> Result<Subscription, DbError> {
        let subscription = self.fetch(id).await?;
        if subscription.owner_id != requester_id {
            return Err(not_found(id));
        }
        Ok(subscription)
    }

    async fn list_where(
        &self,
        filter: &str,
        owner_id: Option<Uuid>,
    ) -> Result<Vec<Subscription>, DbError> {
        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM subscription {filter} \
             ORDER BY created_at ASC"
        );
        let mut builder = self.db.query(&query);
        if let Some(owner_id) = owner_id {
            builder = builder.bind(("owner_id", owner_id.to_string()));
        }

        let mut result = builder.await?;
        let rows: Vec<SubscriptionRowWithId> = result.take(0)?;
        rows.into_iter()
            .map(|row| row.try_into_subscription())
            .collect()
    }

    async fn owners(&self) -> Result<HashMap<Uuid, OwnerSummary>, DbError> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, name, email FROM user")
            .await?;
        let rows: Vec<OwnerRow> = result.take(0)?;

        rows.into_iter()
            .map(|row| -> Result<(Uuid, OwnerSummary), DbError> {
                let id = parse_uuid(&row.record_id, "user")?;
                Ok((
                    id,
                    OwnerSummary {
                        id,
                        name: row.name,
                        email: row.email,
                    },
                ))
            })
            .collect()
    }
}

impl<C: Connection> SubscriptionRepository for SurrealSubscriptionRepository<C> {
    async fn create(
        &self,
        owner_id: Uuid,
        input: CreateSubscription,
    ) -> SubtrackResult<Subscription> {
        let input = input.validated()?;
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('subscription', $id) SET \
                 owner_id = $owner_id, \
                 name = $name, description = $description, \
                 category = $category, \
                 amount = $amount, currency = $currency, \
                 billing_cycle = $billing_cycle, \
                 next_billing_date = $next_billing_date, \
                 status = $status",
            )
            .bind(("id", id_str.clone()))
            .bind(("owner_id", owner_id.to_string()))
            .bind(("name", input.name))
            .bind(("description", input.description))
            .bind(("category", input.category))
            .bind(("amount", input.amount))
            .bind(("currency", input.currency))
            .bind(("billing_cycle", input.billing_cycle.as_str().to_string()))
            .bind(("next_billing_date", input.next_billing_date.to_string()))
            .bind(("status", input.status.as_str().to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement(e, ENTITY))?;

        let rows: Vec<SubscriptionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: ENTITY.into(),
            id: id_str,
        })?;

        let subscription = row.into_subscription(id)?;
        debug!(subscription_id = %id, owner_id = %owner_id, "Subscription created");
        Ok(subscription)
    }

    async fn get(&self, id: Uuid, requester: &Principal) -> SubtrackResult<Subscription> {
        let subscription = self.fetch(id).await?;
        if !requester.can_view(subscription.owner_id) {
            return Err(not_found(id).into());
        }
        Ok(subscription)
    }

    async fn list_for_owner(&self, owner_id: Uuid) -> SubtrackResult<Vec<Subscription>> {
        Ok(self
            .list_where("WHERE owner_id = $owner_id", Some(owner_id))
            .await?)
    }

    async fn list_all(&self) -> SubtrackResult<Vec<SubscriptionWithOwner>> {
        let subscriptions = self.list_where("", None).await?;
        let owners = self.owners().await?;

        Ok(subscriptions
            .into_iter()
            .map(|subscription| {
                let owner = owners.get(&subscription.owner_id).cloned();
                SubscriptionWithOwner {
                    subscription,
                    owner,
                }
            })
            .collect())
    }

    async fn update(
        &self,
        id: Uuid,
        requester_id: Uuid,
        input: UpdateSubscription,
    ) -> SubtrackResult<Subscription> {
        let input = input.validated()?;

        let current = self.fetch_owned(id, requester_id).await?;
        if current.status.is_terminal() {
            return Err(SubtrackError::validation(
                "a cancelled subscription cannot be modified",
            ));
        }

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.description.is_some() {
            sets.push("description = $description");
        }
        if input.category.is_some() {
            sets.push("category = $category");
        }
        if input.amount.is_some() {
            sets.push("amount = $amount");
        }
        if input.currency.is_some() {
            sets.push("currency = $currency");
        }
        if input.billing_cycle.is_some() {
            sets.push("billing_cycle = $billing_cycle");
        }
        if input.next_billing_date.is_some() {
            sets.push("next_billing_date = $next_billing_date");
        }
        if input.status.is_some() {
            sets.push("status = $status");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('subscription', $id) SET {} \
             WHERE owner_id = $owner_id AND status != 'cancelled'",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("id", id.to_string()))
            .bind(("owner_id", requester_id.to_string()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(description) = input.description {
            builder = builder.bind(("description", description));
        }
        if let Some(category) = input.category {
            builder = builder.bind(("category", category));
        }
        if let Some(amount) = input.amount {
            builder = builder.bind(("amount", amount));
        }
        if let Some(currency) = input.currency {
            builder = builder.bind(("currency", currency));
        }
        if let Some(cycle) = input.billing_cycle {
            builder = builder.bind(("billing_cycle", cycle.as_str().to_string()));
        }
        if let Some(date) = input.next_billing_date {
            builder = builder.bind(("next_billing_date", date.to_string()));
        }
        if let Some(status) = input.status {
            builder = builder.bind(("status", status.as_str().to_string()));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement(e, ENTITY))?;

        // Empty when the record was cancelled or removed since the read.
        let rows: Vec<SubscriptionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| not_found(id))?;

        Ok(row.into_subscription(id)?)
    }

    async fn cancel(&self, id: Uuid, requester_id: Uuid) -> SubtrackResult<()> {
        let current = self.fetch_owned(id, requester_id).await?;
        if current.status.is_terminal() {
            return Ok(());
        }

        self.db
            .query(
                "UPDATE type::record('subscription', $id) SET \
                 status = 'cancelled', updated_at = time::now() \
                 WHERE owner_id = $owner_id",
            )
            .bind(("id", id.to_string()))
            .bind(("owner_id", requester_id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::from_statement(e, ENTITY))?;

        debug!(subscription_id = %id, "Subscription cancelled");
        Ok(())
    }
}
