use std::fmt;

use tracing::warn;

use shared::types::GameClaims;

use crate::error::ServiceError;

pub const TOKEN_EXPIRED: &str = "Authorization failed - token expired";
pub const HIGH_LEVEL_REQUIRED: &str = "Authorization failed - high level access required";
pub const INVALID_TOKEN: &str = "Authorization failed - invalid header/token";
pub const PERMISSION_DENIED: &str = "Not authorized for another user";

/// Every operation the service exposes, named the way callers and logs
/// refer to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateUser,
    Login,
    ReadUser,
    UpdateUser,
    DeleteUser,
    ListUsers,
    GrantCurrencies,
    GetVersion,
    CreateItem,
    ReadItem,
    UpdateItem,
    DeleteItem,
    ListItems,
    BuyByUser,
    ThrowAwayByUser,
    EquipByUser,
    GetUserItemsIds,
    GetEquippedUserItemsIds,
    GetStats,
    UpdateStats,
    CreateNews,
    ReadNews,
    UpdateNews,
    ListNews,
}

/// Operations only admins and service callers may invoke.
pub const HIGH_PRIVILEGE_OPERATIONS: [Operation; 9] = [
    Operation::GrantCurrencies,
    Operation::GetVersion,
    Operation::CreateItem,
    Operation::UpdateItem,
    Operation::ThrowAwayByUser,
    Operation::DeleteItem,
    Operation::UpdateStats,
    Operation::CreateNews,
    Operation::UpdateNews,
];

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateUser => "Users/Create",
            Self::Login => "Users/Login",
            Self::ReadUser => "Users/Read",
            Self::UpdateUser => "Users/Update",
            Self::DeleteUser => "Users/Delete",
            Self::ListUsers => "Users/List",
            Self::GrantCurrencies => "Users/GrantCurrencies",
            Self::GetVersion => "UsersService/GetVersion",
            Self::CreateItem => "StoreItems/Create",
            Self::ReadItem => "StoreItems/Read",
            Self::UpdateItem => "StoreItems/Update",
            Self::DeleteItem => "StoreItems/Delete",
            Self::ListItems => "StoreItems/List",
            Self::BuyByUser => "StoreItems/BuyByUser",
            Self::ThrowAwayByUser => "StoreItems/ThrowAwayByUser",
            Self::EquipByUser => "StoreItems/EquipByUser",
            Self::GetUserItemsIds => "StoreItems/GetUserItemsIds",
            Self::GetEquippedUserItemsIds => "StoreItems/GetEquippedUserItemsIds",
            Self::GetStats => "UsersStats/GetStats",
            Self::UpdateStats => "UsersStats/UpdateStats",
            Self::CreateNews => "NewsService/Create",
            Self::ReadNews => "NewsService/Read",
            Self::UpdateNews => "NewsService/Update",
            Self::ListNews => "NewsService/List",
        }
    }

    /// Register and login are reachable without a token.
    pub fn is_public(&self) -> bool {
        matches!(self, Self::CreateUser | Self::Login)
    }

    pub fn requires_high_privilege(&self) -> bool {
        HIGH_PRIVILEGE_OPERATIONS.contains(self)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Subject-level rules applied by an operation once it knows which user
/// it acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Admin, or the caller's own user id.
    SelfOrAdmin,
    /// As `SelfOrAdmin`, or any service caller.
    SelfOrAdminOrService,
    /// Admin, or the subject names the caller by id, username or email.
    SelfByIdentifierOrAdmin,
}

/// A refused call, with the reason handed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denied {
    pub reason: &'static str,
}

impl From<Denied> for ServiceError {
    fn from(denied: Denied) -> Self {
        ServiceError::Unauthenticated(denied.reason.to_string())
    }
}

/// Call-level checks run before any handler: token expiry, then the
/// high-privilege list. Public operations always pass.
pub fn check_call(operation: Operation, claims: &GameClaims, now: i64) -> Result<(), Denied> {
    if operation.is_public() {
        return Ok(());
    }

    if claims.is_expired(now) {
        warn!(
            "{} denied for user '{}': token expired at {}",
            operation, claims.user_id, claims.exp
        );
        return Err(Denied {
            reason: TOKEN_EXPIRED,
        });
    }

    if operation.requires_high_privilege() && !claims.is_privileged() {
        warn!(
            "{} denied for user '{}': high level access required",
            operation, claims.user_id
        );
        return Err(Denied {
            reason: HIGH_LEVEL_REQUIRED,
        });
    }

    Ok(())
}

/// Subject-level check. Runs before the operation touches storage.
pub fn authorize(claims: &GameClaims, policy: Policy, subject_id: &str) -> Result<(), Denied> {
    let allowed = claims.is_admin
        || match policy {
            Policy::SelfOrAdmin => !subject_id.is_empty() && claims.user_id == subject_id,
            Policy::SelfOrAdminOrService => {
                claims.is_service() || (!subject_id.is_empty() && claims.user_id == subject_id)
            }
            Policy::SelfByIdentifierOrAdmin => claims.refers_to(subject_id),
        };

    if allowed {
        Ok(())
    } else {
        warn!(
            "User '{}' is not allowed to act on '{}' ({:?})",
            claims.user_id, subject_id, policy
        );
        Err(Denied {
            reason: PERMISSION_DENIED,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const NOW: i64 = 1_700_000_000;

    fn user(id: &str) -> GameClaims {
        GameClaims {
            user_id: id.into(),
            username: format!("name-{}", id),
            user_email: format!("{}@example.com", id),
            aud: "medieval".into(),
            exp: NOW + 3600,
            ..Default::default()
        }
    }

    fn admin() -> GameClaims {
        GameClaims {
            is_admin: true,
            ..user("admin")
        }
    }

    fn service() -> GameClaims {
        GameClaims {
            aud: "svc".into(),
            exp: NOW + 3600,
            ..Default::default()
        }
    }

    #[test]
    fn high_privilege_list_is_exact() {
        let names: Vec<&str> = HIGH_PRIVILEGE_OPERATIONS.iter().map(|o| o.name()).collect();
        assert_eq!(
            names,
            vec![
                "Users/GrantCurrencies",
                "UsersService/GetVersion",
                "StoreItems/Create",
                "StoreItems/Update",
                "StoreItems/ThrowAwayByUser",
                "StoreItems/Delete",
                "UsersStats/UpdateStats",
                "NewsService/Create",
                "NewsService/Update",
            ]
        );
    }

    #[test]
    fn plain_user_cannot_grant_currencies() {
        let denied = check_call(Operation::GrantCurrencies, &user("u1"), NOW).unwrap_err();
        assert_eq!(denied.reason, HIGH_LEVEL_REQUIRED);
    }

    #[test]
    fn service_caller_may_grant_currencies() {
        assert!(check_call(Operation::GrantCurrencies, &service(), NOW).is_ok());
    }

    #[test]
    fn admin_may_grant_currencies() {
        assert!(check_call(Operation::GrantCurrencies, &admin(), NOW).is_ok());
    }

    #[test]
    fn expired_token_is_denied_before_privilege_check() {
        let mut claims = admin();
        claims.exp = NOW - 1;
        let denied = check_call(Operation::BuyByUser, &claims, NOW).unwrap_err();
        assert_eq!(denied.reason, TOKEN_EXPIRED);
    }

    #[test]
    fn token_expiring_this_second_is_still_valid() {
        let mut claims = user("u1");
        claims.exp = NOW;
        assert!(check_call(Operation::BuyByUser, &claims, NOW).is_ok());
    }

    #[test]
    fn public_operations_need_nothing() {
        let nobody = GameClaims::default();
        assert!(check_call(Operation::CreateUser, &nobody, NOW).is_ok());
        assert!(check_call(Operation::Login, &nobody, NOW).is_ok());
    }

    #[test]
    fn self_or_admin_rejects_other_users() {
        assert!(authorize(&user("u1"), Policy::SelfOrAdmin, "u1").is_ok());
        assert!(authorize(&user("u1"), Policy::SelfOrAdmin, "u2").is_err());
        assert!(authorize(&admin(), Policy::SelfOrAdmin, "u2").is_ok());
    }

    #[test]
    fn self_or_admin_does_not_admit_services() {
        assert!(authorize(&service(), Policy::SelfOrAdmin, "u1").is_err());
    }

    #[test]
    fn service_may_read_anyones_items() {
        assert!(authorize(&service(), Policy::SelfOrAdminOrService, "u1").is_ok());
        assert!(authorize(&user("u2"), Policy::SelfOrAdminOrService, "u1").is_err());
    }

    #[test]
    fn empty_user_id_never_matches_empty_subject() {
        assert!(authorize(&GameClaims::default(), Policy::SelfOrAdmin, "").is_err());
    }

    #[test]
    fn identifier_policy_accepts_name_and_email() {
        let claims = user("u1");
        assert!(authorize(&claims, Policy::SelfByIdentifierOrAdmin, "name-u1").is_ok());
        assert!(authorize(&claims, Policy::SelfByIdentifierOrAdmin, "u1@example.com").is_ok());
        assert!(authorize(&claims, Policy::SelfByIdentifierOrAdmin, "name-u2").is_err());
    }

    proptest! {
        #[test]
        fn non_privileged_callers_never_pass_high_privilege(
            id in "[a-z0-9]{1,12}",
            aud in "[a-z]{0,8}",
            idx in 0usize..HIGH_PRIVILEGE_OPERATIONS.len(),
        ) {
            prop_assume!(aud != "svc");
            let claims = GameClaims { aud, ..user(&id) };
            prop_assert!(check_call(HIGH_PRIVILEGE_OPERATIONS[idx], &claims, NOW).is_err());
        }

        #[test]
        fn users_only_act_on_themselves(a in "[a-z0-9]{1,12}", b in "[a-z0-9]{1,12}") {
            let result = authorize(&user(&a), Policy::SelfOrAdmin, &b);
            prop_assert_eq!(result.is_ok(), a == b);
        }
    }
}
