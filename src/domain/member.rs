//! Club members, tiers, and skill rank bounds.

use serde::{Deserialize, Serialize};

use super::primitives::closed_enum;
use super::{MemberId, Money, TimeMs};

pub const DEFAULT_SKILL_RANK: f64 = 3.0;
pub const MIN_SKILL_RANK: f64 = 2.0;
pub const MAX_SKILL_RANK: f64 = 8.0;

closed_enum! {
    /// Membership tier; declaration order is the tier order.
    Tier, "tier" {
        Standard => "standard",
        Silver => "silver",
        Gold => "gold",
        Diamond => "diamond",
    }
}

impl Tier {
    pub fn can_book_recurring(&self) -> bool {
        *self >= Tier::Gold
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: MemberId,
    pub full_name: String,
    pub balance: Money,
    pub total_spent: Money,
    pub tier: Tier,
    /// `None` until the member plays a ranked match.
    pub skill_rank: Option<f64>,
    pub is_active: bool,
    pub joined_at: TimeMs,
}

impl Member {
    pub fn effective_rank(&self) -> f64 {
        self.skill_rank.unwrap_or(DEFAULT_SKILL_RANK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_tier_order() {
        assert!(Tier::Standard < Tier::Silver);
        assert!(Tier::Silver < Tier::Gold);
        assert!(Tier::Gold < Tier::Diamond);
    }

    #[test]
    fn test_recurring_eligibility() {
        assert!(!Tier::Standard.can_book_recurring());
        assert!(!Tier::Silver.can_book_recurring());
        assert!(Tier::Gold.can_book_recurring());
        assert!(Tier::Diamond.can_book_recurring());
    }

    #[test]
    fn test_tier_parse_is_total() {
        assert_eq!(Tier::from_str("GOLD").unwrap(), Tier::Gold);
        assert_eq!(Tier::from_str(" diamond ").unwrap(), Tier::Diamond);
        let err = Tier::from_str("platinum").unwrap_err();
        assert_eq!(err.field, "tier");
        assert_eq!(err.value, "platinum");
    }
}
