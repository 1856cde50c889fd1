//! Member and court administration.

use tracing::info;

use crate::db::repo::{courts, members};
use crate::db::Repository;
use crate::domain::{Court, Member, MemberId, Money, TimeMs, Tier, DEFAULT_SKILL_RANK};
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq)]
pub struct NewMember {
    /// Identity provider id; generated when absent.
    pub id: Option<MemberId>,
    pub full_name: String,
    pub tier: Tier,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CourtUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub hourly_price: Option<Money>,
}

fn check_price(price: Money) -> Result<(), AppError> {
    if price.is_negative() {
        return Err(AppError::Validation("hourly price must not be negative".into()));
    }
    Ok(())
}

fn check_name(name: &str, what: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation(format!("{} name is required", what)));
    }
    Ok(name.to_string())
}

#[derive(Clone)]
pub struct ClubService {
    repo: Repository,
}

impl ClubService {
    pub fn new(repo: Repository) -> Self {
        ClubService { repo }
    }

    pub async fn create_member(&self, new: NewMember, now: TimeMs) -> Result<Member, AppError> {
        let full_name = check_name(&new.full_name, "member")?;
        let id = match new.id {
            Some(id) if id.as_str().trim().is_empty() => {
                return Err(AppError::Validation("member id must not be blank".into()))
            }
            Some(id) => id,
            None => MemberId::new(uuid::Uuid::new_v4().to_string()),
        };

        let member = Member {
            id,
            full_name,
            balance: Money::zero(),
            total_spent: Money::zero(),
            tier: new.tier,
            skill_rank: Some(DEFAULT_SKILL_RANK),
            is_active: true,
            joined_at: now,
        };

        let mut conn = self.repo.acquire().await?;
        if members::get(&mut conn, &member.id).await?.is_some() {
            return Err(AppError::Validation(format!(
                "member {} already exists",
                member.id
            )));
        }
        members::insert(&mut conn, &member).await?;
        info!(member = %member.id, tier = %member.tier, "member created");
        Ok(member)
    }

    pub async fn member(&self, id: &MemberId) -> Result<Member, AppError> {
        let mut conn = self.repo.acquire().await?;
        members::get(&mut conn, id)
            .await?
            .ok_or_else(|| AppError::not_found("member", id))
    }

    pub async fn create_court(
        &self,
        name: &str,
        description: Option<&str>,
        hourly_price: Money,
    ) -> Result<Court, AppError> {
        let name = check_name(name, "court")?;
        check_price(hourly_price)?;
        let mut conn = self.repo.acquire().await?;
        let court = courts::insert(&mut conn, &name, description, hourly_price).await?;
        info!(court_id = court.id, price = %court.hourly_price, "court created");
        Ok(court)
    }

    pub async fn courts(&self, include_inactive: bool) -> Result<Vec<Court>, AppError> {
        let mut conn = self.repo.acquire().await?;
        Ok(courts::list(&mut conn, include_inactive).await?)
    }

    pub async fn court(&self, id: i64) -> Result<Court, AppError> {
        let mut conn = self.repo.acquire().await?;
        courts::get(&mut conn, id)
            .await?
            .ok_or_else(|| AppError::not_found("court", id))
    }

    pub async fn update_court(&self, id: i64, update: CourtUpdate) -> Result<Court, AppError> {
        let mut conn = self.repo.acquire().await?;
        let mut court = courts::get(&mut conn, id)
            .await?
            .ok_or_else(|| AppError::not_found("court", id))?;
        if let Some(name) = update.name {
            court.name = check_name(&name, "court")?;
        }
        if let Some(description) = update.description {
            court.description = Some(description).filter(|d| !d.trim().is_empty());
        }
        if let Some(price) = update.hourly_price {
            check_price(price)?;
            court.hourly_price = price;
        }
        courts::update(&mut conn, &court).await?;
        info!(court_id = id, "court updated");
        Ok(court)
    }

    /// Soft delete: existing bookings keep pointing at the court.
    pub async fn deactivate_court(&self, id: i64) -> Result<Court, AppError> {
        let mut conn = self.repo.acquire().await?;
        let mut court = courts::get(&mut conn, id)
            .await?
            .ok_or_else(|| AppError::not_found("court", id))?;
        if !court.is_active {
            return Err(AppError::InvalidState(format!("court {} is already inactive", id)));
        }
        court.is_active = false;
        courts::update(&mut conn, &court).await?;
        info!(court_id = id, "court deactivated");
        Ok(court)
    }
}
