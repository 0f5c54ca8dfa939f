use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const TRIAL_DAYS: u16 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingCycle {
    #[default]
    Monthly,
    Annual,
}

impl std::str::FromStr for BillingCycle {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "monthly" | "month" => Ok(Self::Monthly),
            "annual" | "annually" | "yearly" | "year" => Ok(Self::Annual),
            other => Err(CoreError::UnknownBillingCycle(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct PlanTier {
    name: &'static str,
    description: &'static str,
    monthly_price: u32,
    annual_price: u32,
    popular: bool,
    features: &'static [&'static str],
}

impl PlanTier {
    fn is_free(&self) -> bool {
        self.monthly_price == 0 && self.annual_price == 0
    }
}

const TIERS: [PlanTier; 3] = [
    PlanTier {
        name: "Explorer",
        description: "Perfect for occasional travelers",
        monthly_price: 0,
        annual_price: 0,
        popular: false,
        features: &[
            "Basic AI trip planning",
            "Up to 3 destinations per month",
            "Standard recommendations",
            "Community support",
            "Mobile app access",
        ],
    },
    PlanTier {
        name: "Adventurer",
        description: "For frequent travelers who want more",
        monthly_price: 9,
        annual_price: 79,
        popular: true,
        features: &[
            "Advanced AI trip planning",
            "Unlimited destinations",
            "Premium recommendations",
            "Weather-based outfit suggestions",
            "Priority support",
            "Offline access",
            "Custom itinerary export",
        ],
    },
    PlanTier {
        name: "Globetrotter",
        description: "For travel enthusiasts and professionals",
        monthly_price: 19,
        annual_price: 199,
        popular: false,
        features: &[
            "Everything in Adventurer",
            "Concierge trip planning",
            "Exclusive local experiences",
            "Group trip coordination",
            "Travel expense tracking",
            "VIP customer support",
            "Early access to new features",
            "Personal travel consultant",
        ],
    },
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingPlan {
    pub name: String,
    pub description: String,
    pub price: u32,
    pub currency: String,
    pub period: String,
    pub popular: bool,
    pub trial_days: Option<u16>,
    pub annual_savings_percent: u8,
    pub features: Vec<String>,
}

fn savings_percent(tier: &PlanTier) -> u8 {
    if tier.is_free() || tier.monthly_price == 0 {
        return 0;
    }
    let full_year = f64::from(tier.monthly_price * 12);
    ((1.0 - f64::from(tier.annual_price) / full_year) * 100.0)
        .round()
        .max(0.0) as u8
}

/// Percentage saved by paying annually, by plan name. Unknown and free plans save nothing.
pub fn annual_savings_percent(plan_name: &str) -> u8 {
    TIERS
        .iter()
        .find(|tier| tier.name.eq_ignore_ascii_case(plan_name.trim()))
        .map(savings_percent)
        .unwrap_or(0)
}

pub fn pricing_plans(cycle: BillingCycle) -> Vec<PricingPlan> {
    TIERS
        .iter()
        .map(|tier| {
            let (price, period) = match (tier.is_free(), cycle) {
                (true, _) => (0, "Forever Free"),
                (false, BillingCycle::Monthly) => (tier.monthly_price, "per month"),
                (false, BillingCycle::Annual) => (tier.annual_price, "per year"),
            };

            PricingPlan {
                name: tier.name.to_string(),
                description: tier.description.to_string(),
                price,
                currency: "USD".to_string(),
                period: period.to_string(),
                popular: tier.popular,
                trial_days: (!tier.is_free()).then_some(TRIAL_DAYS),
                annual_savings_percent: savings_percent(tier),
                features: tier.features.iter().map(|f| f.to_string()).collect(),
            }
        })
        .collect()
}
