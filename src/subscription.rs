use serde::{Deserialize, Serialize};

use crate::catalog::{BillingInterval, Plan};

pub const SUBSCRIPTION_COLLECTION: &str = "subscription";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Pending,
    Active,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub plan_id: String,
    pub plan_name: String,
    pub price: f64,
    pub interval: BillingInterval,
    pub email: String,
    pub user_id: Option<String>,
    pub status: SubscriptionStatus,
}

impl Subscription {
    /// No payment step exists yet, so every checkout is recorded as active.
    pub fn activate(plan: &Plan, email: String, user_id: Option<String>) -> Self {
        Self {
            plan_id: plan.id.clone(),
            plan_name: plan.name.clone(),
            price: plan.price,
            interval: plan.interval,
            email,
            user_id,
            status: SubscriptionStatus::Active,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    pub plan_id: String,
    pub email: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub subscription_id: String,
    pub status: SubscriptionStatus,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    #[test]
    fn activate_copies_plan_fields() {
        let catalog = Catalog::default();
        let plan = catalog.find("pro").unwrap();
        let sub = Subscription::activate(plan, "x@y.com".into(), None);
        assert_eq!(sub.plan_name, "Pro");
        assert_eq!(sub.price, 29.0);
        assert_eq!(sub.status, SubscriptionStatus::Active);

        let v = serde_json::to_value(&sub).unwrap();
        assert_eq!(v["status"], "active");
        assert_eq!(v["interval"], "month");
        assert!(v["user_id"].is_null());
    }

    #[test]
    fn checkout_request_user_id_is_optional() {
        let req: CheckoutRequest =
            serde_json::from_str(r#"{"plan_id":"pro","email":"x@y.com"}"#).unwrap();
        assert!(req.user_id.is_none());
        assert!(serde_json::from_str::<CheckoutRequest>(r#"{"plan_id":"pro"}"#).is_err());
    }
}
