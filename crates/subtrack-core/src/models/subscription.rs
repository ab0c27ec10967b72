//! Subscription domain model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{SubtrackError, SubtrackResult};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BillingCycle {
    #[default]
    Monthly,
    Quarterly,
    Yearly,
}

impl BillingCycle {
    /// Length of one billing period in months.
    pub fn months(&self) -> u32 {
        match self {
            BillingCycle::Monthly => 1,
            BillingCycle::Quarterly => 3,
            BillingCycle::Yearly => 12,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BillingCycle::Monthly => "monthly",
            BillingCycle::Quarterly => "quarterly",
            BillingCycle::Yearly => "yearly",
        }
    }
}

impl fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BillingCycle {
    type Err = SubtrackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monthly" => Ok(BillingCycle::Monthly),
            "quarterly" => Ok(BillingCycle::Quarterly),
            "yearly" => Ok(BillingCycle::Yearly),
            other => Err(SubtrackError::validation(format!(
                "billing cycle must be monthly, quarterly or yearly, got {other:?}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    #[default]
    Active,
    Inactive,
    Pending,
    /// Terminal. Only reachable through cancellation.
    Cancelled,
}

impl SubscriptionStatus {
    pub fn is_active(&self) -> bool {
        *self == SubscriptionStatus::Active
    }

    pub fn is_terminal(&self) -> bool {
        *self == SubscriptionStatus::Cancelled
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Inactive => "inactive",
            SubscriptionStatus::Pending => "pending",
            SubscriptionStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = SubtrackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(SubscriptionStatus::Active),
            "inactive" => Ok(SubscriptionStatus::Inactive),
            "pending" => Ok(SubscriptionStatus::Pending),
            "cancelled" => Ok(SubscriptionStatus::Cancelled),
            other => Err(SubtrackError::validation(format!(
                "unknown subscription status: {other:?}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: Uuid,
    /// Set once at creation, never reassigned.
    pub owner_id: Uuid,
    pub name: String,
    pub description: String,
    pub category: String,
    pub amount: f64,
    pub currency: String,
    pub billing_cycle: BillingCycle,
    pub next_billing_date: NaiveDate,
    pub status: SubscriptionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

#[derive(Debug, Clone)]
pub struct CreateSubscription {
    pub name: String,
    pub description: String,
    pub category: String,
    pub amount: f64,
    pub currency: String,
    pub billing_cycle: BillingCycle,
    pub next_billing_date: NaiveDate,
    pub status: SubscriptionStatus,
}

impl CreateSubscription {
    /// Trim and normalise the free-text fields, then enforce the record
    /// invariants.
    pub fn validated(mut self) -> SubtrackResult<Self> {
        self.name = validate_name(&self.name)?;
        self.description = self.description.trim().to_string();
        self.category = normalize_category(&self.category);
        validate_amount(self.amount)?;
        self.currency = normalize_currency(&self.currency)?;
        if self.status.is_terminal() {
            return Err(SubtrackError::validation(
                "a subscription cannot be created as cancelled",
            ));
        }
        Ok(self)
    }
}

/// Partial update. The owner is intentionally absent.
#[derive(Debug, Clone, Default)]
pub struct UpdateSubscription {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub billing_cycle: Option<BillingCycle>,
    pub next_billing_date: Option<NaiveDate>,
    pub status: Option<SubscriptionStatus>,
}

impl UpdateSubscription {
    pub fn validated(mut self) -> SubtrackResult<Self> {
        if let Some(name) = &self.name {
            self.name = Some(validate_name(name)?);
        }
        if let Some(description) = &self.description {
            self.description = Some(description.trim().to_string());
        }
        if let Some(category) = &self.category {
            self.category = Some(normalize_category(category));
        }
        if let Some(amount) = self.amount {
            validate_amount(amount)?;
        }
        if let Some(currency) = &self.currency {
            self.currency = Some(normalize_currency(currency)?);
        }
        if self.status.is_some_and(|s| s.is_terminal()) {
            return Err(SubtrackError::validation(
                "use cancellation to cancel a subscription",
            ));
        }
        Ok(self)
    }
}

/// Minimal owner identity attached to admin listings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OwnerSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionWithOwner {
    #[serde(flatten)]
    pub subscription: Subscription,
    pub owner: Option<OwnerSummary>,
}

pub const DEFAULT_CATEGORY: &str = "Other";

/// Largest accepted amount per billing period. Keeps summed spend finite.
pub const MAX_AMOUNT: f64 = 1_000_000_000.0;

fn validate_name(name: &str) -> SubtrackResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(SubtrackError::validation("name is required"));
    }
    Ok(name.to_string())
}

fn validate_amount(amount: f64) -> SubtrackResult<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(SubtrackError::validation("amount must be greater than zero"));
    }
    if amount > MAX_AMOUNT {
        return Err(SubtrackError::validation(format!(
            "amount must not exceed {MAX_AMOUNT}"
        )));
    }
    Ok(())
}

fn normalize_category(category: &str) -> String {
    match category.trim() {
        "" => DEFAULT_CATEGORY.to_string(),
        c => c.to_string(),
    }
}

/// Upper-cases an ISO-like currency code. No conversion tables are
/// consulted; any 3 to 8 ASCII alphanumerics are accepted.
pub fn normalize_currency(currency: &str) -> SubtrackResult<String> {
    let code = currency.trim().to_ascii_uppercase();
    let valid = (3..=8).contains(&code.len()) && code.chars().all(|c| c.is_ascii_alphanumeric());
    if !valid {
        return Err(SubtrackError::validation(format!(
            "currency must be a 3-8 character code, got {currency:?}"
        )));
    }
    Ok(code)
}
