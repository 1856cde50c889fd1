//! Caller identity as asserted by the upstream identity provider.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::domain::MemberId;
use crate::error::AppError;

pub const MEMBER_HEADER: &str = "x-member-id";
pub const ROLES_HEADER: &str = "x-member-roles";

pub const ADMIN_ROLE: &str = "admin";
pub const REFEREE_ROLE: &str = "referee";

/// Authenticated caller; the id is trusted as given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub member_id: MemberId,
    roles: Vec<String>,
}

impl Caller {
    pub fn new(member_id: MemberId, roles: &[&str]) -> Self {
        Caller {
            member_id,
            roles: roles.iter().map(|r| r.to_ascii_lowercase()).collect(),
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ADMIN_ROLE)
    }

    pub fn can_referee(&self) -> bool {
        self.is_admin() || self.has_role(REFEREE_ROLE)
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if !self.is_admin() {
            return Err(AppError::Unauthorized("admin role required".into()));
        }
        Ok(())
    }
}

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let member_id = parts
            .headers
            .get(MEMBER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::Unauthorized(format!("missing {} header", MEMBER_HEADER)))?;

        let roles: Vec<&str> = parts
            .headers
            .get(ROLES_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(',').map(str::trim).filter(|r| !r.is_empty()).collect())
            .unwrap_or_default();

        Ok(Caller::new(MemberId::new(member_id), &roles))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Result<Caller, AppError> {
        let (mut parts, _) = request.into_parts();
        Caller::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_reads_member_and_roles() {
        let caller = extract(
            Request::builder()
                .header(MEMBER_HEADER, "m-1")
                .header(ROLES_HEADER, "Referee, member")
                .body(())
                .unwrap(),
        )
        .await
        .unwrap();

        assert_eq!(caller.member_id, MemberId::new("m-1"));
        assert!(caller.can_referee());
        assert!(!caller.is_admin());
        assert!(caller.require_admin().is_err());
    }

    #[tokio::test]
    async fn test_missing_member_is_unauthorized() {
        let err = extract(Request::builder().body(()).unwrap()).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));

        let err = extract(Request::builder().header(MEMBER_HEADER, "  ").body(()).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
