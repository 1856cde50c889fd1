//! Payment gateway callback verification.
//!
//! The gateway signs `secret|reference|member_id|amount|response_code` with
//! SHA-256 and sends the lowercase hex digest alongside the callback fields.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::{MemberId, Money};

/// Response code the gateway uses for a settled payment.
pub const SUCCESS_CODE: &str = "00";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayCallback {
    pub reference: String,
    pub member_id: MemberId,
    pub amount: Money,
    pub response_code: String,
    pub signature: String,
}

impl GatewayCallback {
    pub fn is_success(&self) -> bool {
        self.response_code == SUCCESS_CODE
    }
}

pub fn sign(
    secret: &str,
    reference: &str,
    member_id: &MemberId,
    amount: Money,
    response_code: &str,
) -> String {
    let payload = format!(
        "{}|{}|{}|{}|{}",
        secret,
        reference,
        member_id.as_str(),
        amount.to_canonical_string(),
        response_code
    );
    hex::encode(Sha256::digest(payload.as_bytes()))
}

/// Case-insensitive on the hex digest; compares every byte.
pub fn verify(secret: &str, callback: &GatewayCallback) -> bool {
    let expected = sign(
        secret,
        &callback.reference,
        &callback.member_id,
        callback.amount,
        &callback.response_code,
    );
    let given = callback.signature.trim().to_ascii_lowercase();
    if given.len() != expected.len() {
        return false;
    }
    expected
        .bytes()
        .zip(given.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}
