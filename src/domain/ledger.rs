//! Wallet ledger transactions.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::primitives::closed_enum;
use super::{MemberId, Money, TimeMs, UnrecognizedValue};

closed_enum! {
    TxKind, "transaction kind" {
        Deposit => "deposit",
        Withdraw => "withdraw",
        Payment => "payment",
        Refund => "refund",
        Reward => "reward",
    }
}

impl TxKind {
    /// Payment and Withdraw move money out of the wallet.
    pub fn is_debit(&self) -> bool {
        matches!(self, TxKind::Payment | TxKind::Withdraw)
    }

    pub fn accepts_amount(&self, amount: Money) -> bool {
        if self.is_debit() {
            amount.is_negative()
        } else {
            amount.is_positive()
        }
    }
}

closed_enum! {
    TxStatus, "transaction status" {
        Pending => "pending",
        Completed => "completed",
        Rejected => "rejected",
        Failed => "failed",
    }
}

impl TxStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TxStatus::Pending)
    }

    pub fn can_transition_to(&self, next: TxStatus) -> bool {
        matches!(
            (self, next),
            (TxStatus::Pending, TxStatus::Completed) | (TxStatus::Pending, TxStatus::Rejected)
        )
    }
}

/// What a ledger entry correlates with; stored as `"<kind>:<id>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LedgerRef {
    Booking(i64),
    Tournament(i64),
    Deposit(String),
    Gateway(String),
}

impl LedgerRef {
    pub fn encode(&self) -> String {
        match self {
            LedgerRef::Booking(id) => format!("booking:{}", id),
            LedgerRef::Tournament(id) => format!("tournament:{}", id),
            LedgerRef::Deposit(r) => format!("deposit:{}", r),
            LedgerRef::Gateway(r) => format!("gateway:{}", r),
        }
    }
}

impl std::fmt::Display for LedgerRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for LedgerRef {
    type Err = UnrecognizedValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unrecognized = || UnrecognizedValue {
            field: "ledger reference",
            value: s.to_string(),
        };
        let (kind, rest) = s.split_once(':').ok_or_else(unrecognized)?;
        match kind {
            "booking" => rest.parse().map(LedgerRef::Booking).map_err(|_| unrecognized()),
            "tournament" => rest
                .parse()
                .map(LedgerRef::Tournament)
                .map_err(|_| unrecognized()),
            "deposit" if !rest.is_empty() => Ok(LedgerRef::Deposit(rest.to_string())),
            "gateway" if !rest.is_empty() => Ok(LedgerRef::Gateway(rest.to_string())),
            _ => Err(unrecognized()),
        }
    }
}

impl Serialize for LedgerRef {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for LedgerRef {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerTransaction {
    pub id: i64,
    pub member_id: MemberId,
    pub amount: Money,
    pub kind: TxKind,
    pub status: TxStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<LedgerRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: TimeMs,
}

/// A ledger entry about to be appended.
///
/// Constructors take the magnitude and apply the sign the kind requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub member_id: MemberId,
    pub amount: Money,
    pub kind: TxKind,
    pub status: TxStatus,
    pub reference: Option<LedgerRef>,
    pub description: Option<String>,
}

impl NewTransaction {
    fn completed(member_id: &MemberId, amount: Money, kind: TxKind) -> Self {
        NewTransaction {
            member_id: member_id.clone(),
            amount,
            kind,
            status: TxStatus::Completed,
            reference: None,
            description: None,
        }
    }

    pub fn payment(member_id: &MemberId, magnitude: Money) -> Self {
        Self::completed(member_id, -magnitude.abs(), TxKind::Payment)
    }

    pub fn refund(member_id: &MemberId, magnitude: Money) -> Self {
        Self::completed(member_id, magnitude.abs(), TxKind::Refund)
    }

    pub fn reward(member_id: &MemberId, magnitude: Money) -> Self {
        Self::completed(member_id, magnitude.abs(), TxKind::Reward)
    }

    pub fn deposit(member_id: &MemberId, magnitude: Money, status: TxStatus) -> Self {
        NewTransaction {
            status,
            ..Self::completed(member_id, magnitude.abs(), TxKind::Deposit)
        }
    }

    pub fn with_reference(mut self, reference: LedgerRef) -> Self {
        self.reference = Some(reference);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Checks the sign rule; the store refuses entries that fail it.
    pub fn validate(&self) -> Result<(), String> {
        if !self.kind.accepts_amount(self.amount) {
            return Err(format!(
                "amount {} has the wrong sign for a {} transaction",
                self.amount, self.kind
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member() -> MemberId {
        MemberId::new("m-1")
    }

    #[test]
    fn test_constructors_apply_sign() {
        let p = NewTransaction::payment(&member(), Money::from_cents(500));
        assert!(p.amount.is_negative());
        assert!(p.validate().is_ok());

        let r = NewTransaction::refund(&member(), Money::from_cents(-500));
        assert!(r.amount.is_positive());
        assert!(r.validate().is_ok());

        let w = NewTransaction::reward(&member(), Money::from_cents(100));
        assert_eq!(w.kind, TxKind::Reward);
        assert!(w.validate().is_ok());
    }

    #[test]
    fn test_wrong_sign_and_zero_rejected() {
        let mut bad = NewTransaction::payment(&member(), Money::from_cents(500));
        bad.amount = Money::from_cents(500);
        assert!(bad.validate().is_err());

        let zero = NewTransaction::deposit(&member(), Money::zero(), TxStatus::Pending);
        assert!(zero.validate().is_err());
    }

    #[test]
    fn test_status_transitions() {
        assert!(TxStatus::Pending.can_transition_to(TxStatus::Completed));
        assert!(TxStatus::Pending.can_transition_to(TxStatus::Rejected));
        assert!(!TxStatus::Pending.can_transition_to(TxStatus::Failed));
        for terminal in [TxStatus::Completed, TxStatus::Rejected, TxStatus::Failed] {
            assert!(terminal.is_terminal());
            for next in TxStatus::ALL {
                assert!(!terminal.can_transition_to(*next));
            }
        }
    }

    #[test]
    fn test_ledger_ref_encoding() {
        assert_eq!(LedgerRef::Booking(42).encode(), "booking:42");
        assert_eq!(
            "tournament:7".parse::<LedgerRef>().unwrap(),
            LedgerRef::Tournament(7)
        );
        assert_eq!(
            "gateway:abc:1".parse::<LedgerRef>().unwrap(),
            LedgerRef::Gateway("abc:1".to_string())
        );
        assert!("booking:x".parse::<LedgerRef>().is_err());
        assert!("nothing".parse::<LedgerRef>().is_err());
    }
}
