pub mod bookings;
pub mod health;
pub mod identity;
pub mod matches;
pub mod members;
pub mod notifications;
pub mod tournaments;
pub mod wallet;

use crate::config::Config;
use crate::db::Repository;
use crate::orchestration::Orchestrator;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

pub use identity::Caller;

#[derive(Clone)]
pub struct AppState {
    pub repo: Repository,
    pub config: Config,
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    pub fn new(repo: Repository, config: Config, orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            repo,
            config,
            orchestrator,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/members", post(members::create_member))
        .route("/v1/members/me", get(members::me))
        .route("/v1/members/:id", get(members::get_member))
        .route(
            "/v1/courts",
            get(members::list_courts).post(members::create_court),
        )
        .route(
            "/v1/courts/:id",
            get(members::get_court)
                .put(members::update_court)
                .delete(members::deactivate_court),
        )
        .route("/v1/bookings", post(bookings::create_booking))
        .route("/v1/bookings/hold", post(bookings::hold_booking))
        .route("/v1/bookings/recurring", post(bookings::create_recurring))
        .route("/v1/bookings/mine", get(bookings::my_bookings))
        .route("/v1/bookings/calendar", get(bookings::calendar))
        .route("/v1/bookings/:id", get(bookings::get_booking))
        .route("/v1/bookings/:id/confirm", post(bookings::confirm_hold))
        .route("/v1/bookings/:id/cancel", post(bookings::cancel_booking))
        .route("/v1/wallet", get(wallet::wallet))
        .route("/v1/wallet/transactions", get(wallet::transactions))
        .route("/v1/wallet/deposits", post(wallet::request_deposit))
        .route(
            "/v1/wallet/deposits/:id/approve",
            post(wallet::approve_deposit),
        )
        .route("/v1/wallet/deposits/:id/reject", post(wallet::reject_deposit))
        .route("/v1/payments/callback", post(wallet::payment_callback))
        .route(
            "/v1/tournaments",
            get(tournaments::list_tournaments).post(tournaments::create_tournament),
        )
        .route("/v1/tournaments/:id", get(tournaments::get_tournament))
        .route("/v1/tournaments/:id/join", post(tournaments::join_tournament))
        .route(
            "/v1/tournaments/:id/schedule",
            post(tournaments::generate_schedule),
        )
        .route(
            "/v1/tournaments/:id/finish",
            post(tournaments::finish_tournament),
        )
        .route("/v1/matches", get(matches::list_matches))
        .route("/v1/matches/mine", get(matches::my_matches))
        .route("/v1/matches/duel", post(matches::create_duel))
        .route("/v1/matches/:id", get(matches::get_match))
        .route("/v1/matches/:id/result", post(matches::update_result))
        .route("/v1/notifications", get(notifications::list_notifications))
        .route(
            "/v1/notifications/unread-count",
            get(notifications::unread_count),
        )
        .route("/v1/notifications/:id/read", post(notifications::mark_read))
        .layer(cors)
        .with_state(state)
}
