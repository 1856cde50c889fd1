use std::sync::Arc;

use crate::config::Config;
use crate::db::Repository;
use crate::notify::{NotificationChannel, Notifier};
use crate::orchestration::bookings::BookingService;
use crate::orchestration::matches::MatchService;
use crate::orchestration::members::ClubService;
use crate::orchestration::recurring::RecurringService;
use crate::orchestration::tournaments::TournamentService;
use crate::orchestration::wallet::WalletService;

/// Every service wired to one repository and one notifier.
#[derive(Clone)]
pub struct Orchestrator {
    pub club: ClubService,
    pub bookings: BookingService,
    pub recurring: RecurringService,
    pub wallet: WalletService,
    pub tournaments: TournamentService,
    pub matches: MatchService,
    pub notifier: Notifier,
}

impl Orchestrator {
    pub fn new(repo: Repository, config: &Config, channel: Arc<dyn NotificationChannel>) -> Self {
        let notifier = Notifier::new(repo.clone(), channel);
        Self {
            club: ClubService::new(repo.clone()),
            bookings: BookingService::new(repo.clone(), notifier.clone(), config.hold_expiry),
            recurring: RecurringService::new(repo.clone(), notifier.clone()),
            wallet: WalletService::new(
                repo.clone(),
                notifier.clone(),
                config.payment_hash_secret.clone(),
            ),
            tournaments: TournamentService::new(
                repo.clone(),
                notifier.clone(),
                config.hybrid_default_groups,
            ),
            matches: MatchService::new(repo, notifier.clone()),
            notifier,
        }
    }
}
