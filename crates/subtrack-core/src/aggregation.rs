//! Monthly spend aggregation over a caller's subscriptions.
//!
//! Everything here is a pure function of its input. Amounts in different
//! currencies are summed as plain numbers: there is no exchange-rate
//! lookup, and the resulting total is only labelled with the dominant
//! currency for display. A mixed-currency total is therefore not a real
//! converted figure.

use serde::Serialize;

use crate::models::subscription::{BillingCycle, Subscription};

/// Currency label used when there is nothing to count.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Normalise a per-cycle amount to one month. The divisor is the cycle
/// length in months; no calendar proration.
pub fn monthly_equivalent(amount: f64, cycle: BillingCycle) -> f64 {
    amount / f64::from(cycle.months())
}

/// Sum of monthly equivalents over active subscriptions. Inactive,
/// pending and cancelled ones contribute nothing.
pub fn total_monthly_spend<'a, I>(subscriptions: I) -> f64
where
    I: IntoIterator<Item = &'a Subscription>,
{
    subscriptions
        .into_iter()
        .filter(|s| s.is_active())
        .map(|s| monthly_equivalent(s.amount, s.billing_cycle))
        .sum()
}

/// Most frequent currency code across the whole set, regardless of
/// status. Ties go to the code seen first; an empty set yields
/// `default`.
pub fn dominant_currency<'a, I>(subscriptions: I, default: &str) -> String
where
    I: IntoIterator<Item = &'a Subscription>,
{
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for sub in subscriptions {
        match counts.iter_mut().find(|(code, _)| *code == sub.currency) {
            Some((_, n)) => *n += 1,
            None => counts.push((sub.currency.as_str(), 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (code, n) in counts {
        // Strictly greater keeps the earliest code on ties.
        if best.is_none_or(|(_, top)| n > top) {
            best = Some((code, n));
        }
    }

    best.map_or_else(|| default.to_string(), |(code, _)| code.to_string())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendSummary {
    pub total_monthly: f64,
    pub currency: String,
    pub active_count: usize,
    pub subscription_count: usize,
}

pub fn summarize(subscriptions: &[Subscription], default_currency: &str) -> SpendSummary {
    SpendSummary {
        total_monthly: total_monthly_spend(subscriptions),
        currency: dominant_currency(subscriptions, default_currency),
        active_count: subscriptions.iter().filter(|s| s.is_active()).count(),
        subscription_count: subscriptions.len(),
    }
}
