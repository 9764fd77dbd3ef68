//! Fixed speed-upgrade offers

use crate::runtime::OfferEngine;
use crate::state_machine::{CustomerProfile, Offer};
use std::collections::HashMap;

/// Offer engine with a fixed current-speed to offered-speed table
pub struct FixedUpgradeOffers {
    upgrades: HashMap<u32, u32>,
    valid_until: String,
}

impl Default for FixedUpgradeOffers {
    fn default() -> Self {
        Self::new([(100, 250)], "2026-12-31")
    }
}

impl FixedUpgradeOffers {
    pub fn new(upgrades: impl IntoIterator<Item = (u32, u32)>, valid_until: &str) -> Self {
        Self {
            upgrades: upgrades.into_iter().collect(),
            valid_until: valid_until.to_string(),
        }
    }
}

impl OfferEngine for FixedUpgradeOffers {
    fn upgrade_for(&self, current_plan_mbps: u32) -> Option<u32> {
        self.upgrades.get(&current_plan_mbps).copied()
    }

    fn prepare(&self, profile: &CustomerProfile) -> Offer {
        let current = profile.current_plan_mbps;
        let offered = self.upgrade_for(current);
        let description = match offered {
            Some(target) => {
                format!("Upgrade internet speed from {current} Mbps to {target} Mbps.")
            }
            None => format!("No upgrade is available for the {current} Mbps plan."),
        };

        let id = uuid::Uuid::new_v4().simple().to_string();
        Offer {
            offer_id: format!("offer-{}", id.chars().take(8).collect::<String>()),
            customer_id: profile.customer_id.clone(),
            current_plan_mbps: current,
            offered_plan_mbps: offered,
            price_delta_czk: 0,
            description,
            valid_until: self.valid_until.clone(),
        }
    }
}
