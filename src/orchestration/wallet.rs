//! Wallet: the only place balances change.
//!
//! [`lock_member`] and [`post`] are the primitives every money-moving
//! operation uses inside its transaction. [`WalletService`] adds the member
//! facing wallet operations: history, deposit requests, admin review, and
//! gateway callbacks.

use serde::Serialize;
use sqlx::sqlite::SqliteConnection;
use tracing::{info, warn};

use super::retry::retry_busy;
use crate::db::repo::{ledger, members};
use crate::db::Repository;
use crate::domain::{
    LedgerRef, LedgerTransaction, Member, MemberId, Money, NewTransaction, NotificationEvent,
    Severity, TimeMs, TxKind, TxStatus,
};
use crate::error::AppError;
use crate::notify::Notifier;
use crate::payment::{self, GatewayCallback};

pub const RECENT_TRANSACTIONS: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Take the write lock on `id` and load the member as it is now.
pub async fn lock_member(conn: &mut SqliteConnection, id: &MemberId) -> Result<Member, AppError> {
    if !members::touch(&mut *conn, id).await? {
        return Err(AppError::not_found("member", id));
    }
    members::get(conn, id)
        .await?
        .ok_or_else(|| AppError::not_found("member", id))
}

/// Append a ledger entry and, when it is Completed, apply it to the balance.
///
/// `member` must come from [`lock_member`] in the same transaction; it is
/// updated in place. Debits never take the balance below zero.
pub async fn post(
    conn: &mut SqliteConnection,
    member: &mut Member,
    entry: NewTransaction,
    now: TimeMs,
) -> Result<LedgerTransaction, AppError> {
    if entry.member_id != member.id {
        return Err(AppError::Internal(format!(
            "ledger entry for {} posted against {}",
            entry.member_id, member.id
        )));
    }
    entry.validate().map_err(AppError::Validation)?;

    if entry.status == TxStatus::Completed {
        credit(conn, member, entry.amount, entry.kind).await?;
    }
    Ok(ledger::insert(conn, &entry, now).await?)
}

/// Apply a signed amount to the wallet columns; Payments count toward lifetime spend.
async fn credit(
    conn: &mut SqliteConnection,
    member: &mut Member,
    amount: Money,
    kind: TxKind,
) -> Result<(), AppError> {
    let out_of_range = || AppError::Validation(format!("amount {} is out of range", amount));
    let balance = member.balance.checked_add(amount).ok_or_else(out_of_range)?;
    if balance.is_negative() {
        return Err(AppError::InsufficientFunds {
            required: amount.abs(),
            available: member.balance,
        });
    }
    let total_spent = if kind == TxKind::Payment {
        member
            .total_spent
            .checked_add(amount.abs())
            .ok_or_else(out_of_range)?
    } else {
        member.total_spent
    };

    members::set_wallet(&mut *conn, &member.id, balance, total_spent).await?;
    member.balance = balance;
    member.total_spent = total_spent;
    Ok(())
}

pub fn ensure_funds(member: &Member, required: Money) -> Result<(), AppError> {
    if member.balance < required {
        return Err(AppError::InsufficientFunds {
            required,
            available: member.balance,
        });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletInfo {
    pub member_id: MemberId,
    pub balance: Money,
    pub total_spent: Money,
    pub recent_transactions: Vec<LedgerTransaction>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPage {
    pub items: Vec<LedgerTransaction>,
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
}

/// What a gateway callback did to the wallet.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum GatewayOutcome {
    Credited { transaction: LedgerTransaction },
    /// The reference was already credited; nothing changed.
    AlreadyProcessed { transaction: LedgerTransaction },
    /// The gateway reported a failed payment.
    Declined { response_code: String },
}

#[derive(Clone)]
pub struct WalletService {
    repo: Repository,
    notifier: Notifier,
    payment_secret: Option<String>,
}

impl WalletService {
    pub fn new(repo: Repository, notifier: Notifier, payment_secret: Option<String>) -> Self {
        WalletService {
            repo,
            notifier,
            payment_secret,
        }
    }

    pub async fn info(&self, member_id: &MemberId) -> Result<WalletInfo, AppError> {
        let mut conn = self.repo.acquire().await?;
        let member = members::get(&mut conn, member_id)
            .await?
            .ok_or_else(|| AppError::not_found("member", member_id))?;
        let recent = ledger::list_for_member(&mut conn, member_id, RECENT_TRANSACTIONS, 0).await?;
        Ok(WalletInfo {
            member_id: member.id,
            balance: member.balance,
            total_spent: member.total_spent,
            recent_transactions: recent,
        })
    }

    /// 1-based pages, newest first.
    pub async fn history(
        &self,
        member_id: &MemberId,
        page: i64,
        page_size: i64,
    ) -> Result<TransactionPage, AppError> {
        if page < 1 {
            return Err(AppError::Validation("page must be at least 1".into()));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(AppError::Validation(format!(
                "pageSize must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }

        let mut conn = self.repo.acquire().await?;
        let items =
            ledger::list_for_member(&mut conn, member_id, page_size, (page - 1) * page_size).await?;
        let total = ledger::count_for_member(&mut conn, member_id).await?;
        Ok(TransactionPage {
            items,
            page,
            page_size,
            total,
        })
    }

    /// Record a Pending deposit for an admin to review; the balance is untouched.
    pub async fn request_deposit(
        &self,
        member_id: &MemberId,
        amount: Money,
        note: Option<String>,
        now: TimeMs,
    ) -> Result<LedgerTransaction, AppError> {
        if !amount.is_positive() {
            return Err(AppError::Validation("deposit amount must be greater than 0".into()));
        }
        let amount = amount.round_cents();

        let transaction = retry_busy("request_deposit", || async {
            let mut tx = self.repo.begin().await?;
            let mut member = lock_member(&mut tx, member_id).await?;
            let entry = NewTransaction::deposit(member_id, amount, TxStatus::Pending)
                .with_reference(LedgerRef::Deposit(uuid::Uuid::new_v4().to_string()))
                .with_description(
                    note.clone()
                        .unwrap_or_else(|| format!("Deposit request of {}", amount)),
                );
            let stored = post(&mut tx, &mut member, entry, now).await?;
            tx.commit().await?;
            Ok(stored)
        })
        .await?;

        info!(member = %member_id, tx_id = transaction.id, %amount, "deposit requested");
        Ok(transaction)
    }

    /// Pending → Completed, crediting the member in the same transaction.
    pub async fn approve_deposit(
        &self,
        transaction_id: i64,
        now: TimeMs,
    ) -> Result<LedgerTransaction, AppError> {
        let approved = retry_busy("approve_deposit", || async {
            let mut tx = self.repo.begin().await?;
            let pending = reviewable_deposit(&mut tx, transaction_id).await?;
            let mut member = lock_member(&mut tx, &pending.member_id).await?;

            if !ledger::transition(
                &mut tx,
                transaction_id,
                TxStatus::Pending,
                TxStatus::Completed,
                None,
            )
            .await?
            {
                return Err(AppError::InvalidState(format!(
                    "transaction {} is no longer pending",
                    transaction_id
                )));
            }
            credit(&mut tx, &mut member, pending.amount, TxKind::Deposit).await?;
            tx.commit().await?;
            Ok(LedgerTransaction {
                status: TxStatus::Completed,
                ..pending
            })
        })
        .await?;

        info!(tx_id = approved.id, member = %approved.member_id, "deposit approved");
        self.notifier
            .emit(
                NotificationEvent::new(
                    &approved.member_id,
                    format!("Your deposit of {} was approved", approved.amount),
                    Severity::Success,
                )
                .with_link("/wallet")
                .at(now),
            )
            .await;
        Ok(approved)
    }

    /// Pending → Rejected; the balance is untouched.
    pub async fn reject_deposit(
        &self,
        transaction_id: i64,
        reason: Option<String>,
        now: TimeMs,
    ) -> Result<LedgerTransaction, AppError> {
        let reason = reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());

        let rejected = retry_busy("reject_deposit", || async {
            let mut tx = self.repo.begin().await?;
            let pending = reviewable_deposit(&mut tx, transaction_id).await?;
            let description = reason
                .as_ref()
                .map(|r| format!("Rejected: {}", r));

            if !ledger::transition(
                &mut tx,
                transaction_id,
                TxStatus::Pending,
                TxStatus::Rejected,
                description.as_deref(),
            )
            .await?
            {
                return Err(AppError::InvalidState(format!(
                    "transaction {} is no longer pending",
                    transaction_id
                )));
            }
            tx.commit().await?;
            Ok(LedgerTransaction {
                status: TxStatus::Rejected,
                description: description.or(pending.description.clone()),
                ..pending
            })
        })
        .await?;

        info!(tx_id = rejected.id, member = %rejected.member_id, "deposit rejected");
        let message = match &reason {
            Some(r) => format!("Your deposit of {} was rejected: {}", rejected.amount, r),
            None => format!("Your deposit of {} was rejected", rejected.amount),
        };
        self.notifier
            .emit(
                NotificationEvent::new(&rejected.member_id, message, Severity::Warning)
                    .with_link("/wallet")
                    .at(now),
            )
            .await;
        Ok(rejected)
    }

    /// Credit a signed gateway payment once per reference.
    pub async fn gateway_callback(
        &self,
        callback: &GatewayCallback,
        now: TimeMs,
    ) -> Result<GatewayOutcome, AppError> {
        let secret = self
            .payment_secret
            .as_deref()
            .ok_or_else(|| AppError::Unauthorized("payment gateway is not configured".into()))?;
        if !payment::verify(secret, callback) {
            warn!(reference = %callback.reference, "gateway callback with bad signature");
            return Err(AppError::Unauthorized("invalid payment signature".into()));
        }
        if callback.reference.trim().is_empty() {
            return Err(AppError::Validation("payment reference is required".into()));
        }
        if !callback.is_success() {
            info!(
                reference = %callback.reference,
                code = %callback.response_code,
                "gateway reported a failed payment"
            );
            return Ok(GatewayOutcome::Declined {
                response_code: callback.response_code.clone(),
            });
        }
        if !callback.amount.is_positive() {
            return Err(AppError::Validation("payment amount must be greater than 0".into()));
        }

        let reference = LedgerRef::Gateway(callback.reference.clone());
        let outcome = retry_busy("gateway_callback", || async {
            let mut tx = self.repo.begin().await?;
            let mut member = lock_member(&mut tx, &callback.member_id).await?;
            if let Some(existing) = ledger::find_by_reference(&mut tx, &reference).await? {
                return Ok(GatewayOutcome::AlreadyProcessed {
                    transaction: existing,
                });
            }
            let entry = NewTransaction::deposit(
                &callback.member_id,
                callback.amount.round_cents(),
                TxStatus::Completed,
            )
            .with_reference(reference.clone())
            .with_description(format!("Online deposit {}", callback.reference));
            let stored = post(&mut tx, &mut member, entry, now).await?;
            tx.commit().await?;
            Ok(GatewayOutcome::Credited {
                transaction: stored,
            })
        })
        .await?;

        if let GatewayOutcome::Credited { transaction } = &outcome {
            info!(member = %transaction.member_id, tx_id = transaction.id, "gateway deposit credited");
            self.notifier
                .emit(
                    NotificationEvent::new(
                        &transaction.member_id,
                        format!("Online deposit of {} received", transaction.amount),
                        Severity::Success,
                    )
                    .with_link("/wallet")
                    .at(now),
                )
                .await;
        }
        Ok(outcome)
    }
}

async fn reviewable_deposit(
    conn: &mut SqliteConnection,
    transaction_id: i64,
) -> Result<LedgerTransaction, AppError> {
    let pending = ledger::get(conn, transaction_id)
        .await?
        .ok_or_else(|| AppError::not_found("transaction", transaction_id))?;
    if pending.kind != TxKind::Deposit {
        return Err(AppError::InvalidState(format!(
            "transaction {} is a {}, not a deposit",
            transaction_id, pending.kind
        )));
    }
    if pending.status.is_terminal() {
        return Err(AppError::InvalidState(format!(
            "transaction {} is already {}",
            transaction_id, pending.status
        )));
    }
    Ok(pending)
}
