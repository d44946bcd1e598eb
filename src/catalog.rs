use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingInterval {
    #[default]
    Month,
    Year,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: String,
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub interval: BillingInterval,
    pub features: Vec<String>,
    #[serde(default)]
    pub most_popular: bool,
}

impl Plan {
    fn monthly(id: &str, name: &str, price: f64, features: &[&str], most_popular: bool) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            price,
            interval: BillingInterval::Month,
            features: features.iter().map(|f| f.to_string()).collect(),
            most_popular,
        }
    }
}

/// Plans offered by the service. Built once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct Catalog {
    plans: Vec<Plan>,
}

impl Catalog {
    pub fn new(plans: Vec<Plan>) -> Self {
        Self { plans }
    }

    pub fn plans(&self) -> &[Plan] {
        &self.plans
    }

    /// Exact match on `id`; first match wins.
    pub fn find(&self, plan_id: &str) -> Option<&Plan> {
        self.plans.iter().find(|p| p.id == plan_id)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(vec![
            Plan::monthly(
                "starter",
                "Starter",
                9.0,
                &["Unlimited projects", "Community support", "Basic analytics"],
                false,
            ),
            Plan::monthly(
                "pro",
                "Pro",
                29.0,
                &[
                    "Everything in Starter",
                    "Advanced analytics",
                    "Priority support",
                    "Team collaboration",
                ],
                true,
            ),
            Plan::monthly(
                "business",
                "Business",
                79.0,
                &[
                    "Everything in Pro",
                    "SLA & SSO",
                    "Audit logs",
                    "Dedicated success manager",
                ],
                false,
            ),
        ])
    }
}
