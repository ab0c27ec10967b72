//! Subscription endpoints. Every route here sits behind the bearer
//! middleware; ownership is decided by the repository.

use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use subtrack_auth::guard;
use subtrack_core::aggregation::summarize;
use subtrack_core::error::SubtrackError;
use subtrack_core::models::principal::Principal;
use subtrack_core::models::subscription::{
    BillingCycle, CreateSubscription, SubscriptionStatus, UpdateSubscription,
};
use subtrack_core::repository::SubscriptionRepository;
use tracing::info;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// `isActive` is the older boolean spelling of `status`; an explicit
/// `status` wins.
fn resolve_status(
    status: Option<SubscriptionStatus>,
    is_active: Option<bool>,
) -> Option<SubscriptionStatus> {
    status.or_else(|| {
        is_active.map(|active| {
            if active {
                SubscriptionStatus::Active
            } else {
                SubscriptionStatus::Inactive
            }
        })
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubscriptionRequest {
    #[serde(default, alias = "planName")]
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    #[serde(alias = "price")]
    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub billing_cycle: Option<BillingCycle>,
    pub next_billing_date: Option<NaiveDate>,
    pub status: Option<SubscriptionStatus>,
    pub is_active: Option<bool>,
}

impl CreateSubscriptionRequest {
    fn into_input(
        self,
        default_currency: &str,
        today: NaiveDate,
    ) -> Result<CreateSubscription, SubtrackError> {
        let amount = self
            .amount
            .ok_or_else(|| SubtrackError::validation("amount is required"))?;

        Ok(CreateSubscription {
            name: self.name,
            description: self.description.unwrap_or_default(),
            category: self.category.unwrap_or_default(),
            amount,
            currency: self.currency.unwrap_or_else(|| default_currency.to_string()),
            billing_cycle: self.billing_cycle.unwrap_or_default(),
            next_billing_date: self.next_billing_date.unwrap_or(today),
            status: resolve_status(self.status, self.is_active).unwrap_or_default(),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubscriptionRequest {
    #[serde(alias = "planName")]
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    #[serde(alias = "price")]
    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub billing_cycle: Option<BillingCycle>,
    pub next_billing_date: Option<NaiveDate>,
    pub status: Option<SubscriptionStatus>,
    pub is_active: Option<bool>,
}

impl From<UpdateSubscriptionRequest> for UpdateSubscription {
    fn from(req: UpdateSubscriptionRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            category: req.category,
            amount: req.amount,
            currency: req.currency,
            billing_cycle: req.billing_cycle,
            next_billing_date: req.next_billing_date,
            status: resolve_status(req.status, req.is_active),
        }
    }
}

pub async fn create(
    state: web::Data<AppState>,
    principal: web::ReqData<Principal>,
    body: web::Json<CreateSubscriptionRequest>,
) -> Result<HttpResponse, ApiError> {
    let today = state.clock.now().date_naive();
    let input = body.into_inner().into_input(&state.default_currency, today)?;

    let subscription = state
        .subscriptions
        .create(principal.user_id, input)
        .await?;
    info!(
        subscription_id = %subscription.id,
        user_id = %principal.user_id,
        "Subscription created"
    );

    Ok(HttpResponse::Created().json(json!({ "subscription": subscription })))
}

pub async fn list(
    state: web::Data<AppState>,
    principal: web::ReqData<Principal>,
) -> Result<HttpResponse, ApiError> {
    let subscriptions = state.subscriptions.list_for_owner(principal.user_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "subscriptions": subscriptions })))
}

pub async fn summary(
    state: web::Data<AppState>,
    principal: web::ReqData<Principal>,
) -> Result<HttpResponse, ApiError> {
    let subscriptions = state.subscriptions.list_for_owner(principal.user_id).await?;
    Ok(HttpResponse::Ok().json(summarize(&subscriptions, &state.default_currency)))
}

pub async fn list_all(
    state: web::Data<AppState>,
    principal: web::ReqData<Principal>,
) -> Result<HttpResponse, ApiError> {
    guard::require_admin(&principal)?;
    let subscriptions = state.subscriptions.list_all().await?;
    Ok(HttpResponse::Ok().json(json!({ "subscriptions": subscriptions })))
}

pub async fn get(
    state: web::Data<AppState>,
    principal: web::ReqData<Principal>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let subscription = state
        .subscriptions
        .get(path.into_inner(), &principal)
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "subscription": subscription })))
}

pub async fn update(
    state: web::Data<AppState>,
    principal: web::ReqData<Principal>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateSubscriptionRequest>,
) -> Result<HttpResponse, ApiError> {
    let subscription = state
        .subscriptions
        .update(path.into_inner(), principal.user_id, body.into_inner().into())
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "subscription": subscription })))
}

pub async fn cancel(
    state: web::Data<AppState>,
    principal: web::ReqData<Principal>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    state.subscriptions.cancel(id, principal.user_id).await?;
    info!(subscription_id = %id, user_id = %principal.user_id, "Subscription cancelled");
    Ok(HttpResponse::Ok().json(json!({ "message": "Subscription cancelled successfully" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
    }

    #[test]
    fn create_request_applies_defaults() {
        let req: CreateSubscriptionRequest =
            serde_json::from_str(r#"{"planName": "Netflix", "price": 15.99}"#).unwrap();
        let input = req.into_input("EUR", today()).unwrap();

        assert_eq!(input.name, "Netflix");
        assert_eq!(input.amount, 15.99);
        assert_eq!(input.currency, "EUR");
        assert_eq!(input.billing_cycle, BillingCycle::Monthly);
        assert_eq!(input.next_billing_date, today());
        assert_eq!(input.status, SubscriptionStatus::Active);
        assert!(input.category.is_empty());
    }

    #[test]
    fn create_request_reads_full_body() {
        let req: CreateSubscriptionRequest = serde_json::from_str(
            r#"{
                "name": "Adobe",
                "amount": 120,
                "currency": "usd",
                "billingCycle": "yearly",
                "nextBillingDate": "2025-12-01",
                "category": "Software",
                "isActive": false,
                "ownerId": "ignored"
            }"#,
        )
        .unwrap();
        let input = req.into_input("EUR", today()).unwrap();

        assert_eq!(input.amount, 120.0);
        assert_eq!(input.billing_cycle, BillingCycle::Yearly);
        assert_eq!(
            input.next_billing_date,
            NaiveDate::from_ymd_opt(2025, 12, 1).unwrap()
        );
        assert_eq!(input.status, SubscriptionStatus::Inactive);
    }

    #[test]
    fn missing_amount_is_a_validation_error() {
        let req: CreateSubscriptionRequest =
            serde_json::from_str(r#"{"name": "Netflix"}"#).unwrap();
        assert!(matches!(
            req.into_input("USD", today()),
            Err(SubtrackError::Validation { .. })
        ));
    }

    #[test]
    fn explicit_status_wins_over_is_active() {
        assert_eq!(
            resolve_status(Some(SubscriptionStatus::Pending), Some(true)),
            Some(SubscriptionStatus::Pending)
        );
        assert_eq!(
            resolve_status(None, Some(true)),
            Some(SubscriptionStatus::Active)
        );
        assert_eq!(resolve_status(None, None), None);
    }
}
