//! Role-based routing after sign-in.

use student_portal_core::{AccountId, AccountRole};

use crate::db::accounts::AccountRepository;
use crate::gateway::{AccessToken, IdentityGateway};
use crate::models::Account;
use crate::services::auth::AuthError;

/// Pages the portal sends users to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Landing,
    StudentLogin,
    AdminLogin,
    CourseSelection,
    StudentDashboard,
    AdminDashboard,
}

impl Destination {
    /// Dashboard for a role.
    #[must_use]
    pub const fn for_role(role: AccountRole) -> Self {
        match role {
            AccountRole::Student => Self::StudentDashboard,
            AccountRole::Admin => Self::AdminDashboard,
        }
    }

    /// Login page guarding a role's pages.
    #[must_use]
    pub const fn login_for(role: AccountRole) -> Self {
        match role {
            AccountRole::Student => Self::StudentLogin,
            AccountRole::Admin => Self::AdminLogin,
        }
    }

    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Landing => "/",
            Self::StudentLogin => "/login",
            Self::AdminLogin => "/admin/login",
            Self::CourseSelection => "/signup/courses",
            Self::StudentDashboard => "/dashboard",
            Self::AdminDashboard => "/admin/dashboard",
        }
    }
}

/// Resolves where a freshly signed-in account belongs.
pub struct RoleRouter<'a> {
    accounts: AccountRepository<'a>,
}

impl<'a> RoleRouter<'a> {
    /// Create a router reading profiles as the holder of `token`.
    #[must_use]
    pub const fn new(gateway: &'a dyn IdentityGateway, token: Option<&'a AccessToken>) -> Self {
        Self {
            accounts: AccountRepository::new(gateway, token),
        }
    }

    /// Look up the account's profile and pick its dashboard.
    ///
    /// A lookup failure and a missing profile are treated the same way.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidAccountType` if the profile cannot be
    /// read, is missing, or has no recognized role.
    pub async fn route(&self, id: AccountId) -> Result<(Account, Destination), AuthError> {
        match self.accounts.get_by_id(id).await {
            Ok(Some(account)) => {
                let destination = Destination::for_role(account.role);
                Ok((account, destination))
            }
            Ok(None) => {
                tracing::warn!(account_id = %id, "Signed-in account has no profile");
                Err(AuthError::InvalidAccountType)
            }
            Err(e) => {
                tracing::warn!(account_id = %id, error = %e, "Role lookup failed");
                Err(AuthError::InvalidAccountType)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::gateway::{GatewayOperation, InMemoryGateway};

    fn seed(gateway: &InMemoryGateway, role: serde_json::Value) -> AccountId {
        let id = AccountId::generate();
        gateway.insert_row(
            "users",
            json!({
                "id": id.to_string(),
                "email": "someone@example.edu",
                "full_name": "Some One",
                "role": role,
            }),
        );
        id
    }

    #[tokio::test]
    async fn test_routes_by_role() {
        let gateway = InMemoryGateway::new();
        let student = seed(&gateway, json!("student"));
        let admin = seed(&gateway, json!("admin"));
        let router = RoleRouter::new(&gateway, None);

        let (_, destination) = router.route(student).await.unwrap();
        assert_eq!(destination.path(), "/dashboard");

        let (account, destination) = router.route(admin).await.unwrap();
        assert_eq!(account.role, AccountRole::Admin);
        assert_eq!(destination.path(), "/admin/dashboard");
    }

    #[tokio::test]
    async fn test_null_unknown_or_missing_role_is_rejected() {
        let gateway = InMemoryGateway::new();
        let null_role = seed(&gateway, serde_json::Value::Null);
        let unknown = seed(&gateway, json!("instructor"));
        let router = RoleRouter::new(&gateway, None);

        for id in [null_role, unknown, AccountId::generate()] {
            assert!(matches!(
                router.route(id).await,
                Err(AuthError::InvalidAccountType)
            ));
        }
    }

    #[tokio::test]
    async fn test_lookup_failure_is_rejected_like_missing_profile() {
        let gateway = InMemoryGateway::new();
        let student = seed(&gateway, json!("student"));
        gateway.fail(GatewayOperation::Select);

        let result = RoleRouter::new(&gateway, None).route(student).await;

        assert!(matches!(result, Err(AuthError::InvalidAccountType)));
    }

    #[test]
    fn test_login_pages() {
        assert_eq!(Destination::login_for(AccountRole::Student).path(), "/login");
        assert_eq!(Destination::login_for(AccountRole::Admin).path(), "/admin/login");
    }
}
