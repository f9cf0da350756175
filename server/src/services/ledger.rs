//! Balance-changing operations: buying, throwing away and granting.
//!
//! Each runs in one transaction whose first statement takes the user's
//! write lock, so the balance read afterwards is the one the debit or
//! credit is applied to.

use tracing::{info, warn};

use shared::types::{Balances, GameClaims, GrantCurrenciesRequest};

use crate::auth::{Policy, authorize};
use crate::database::{get_timestamp, possessions, store_items, users};
use crate::error::{ServiceError, ServiceResult, storage};
use crate::services::store_items::StoreService;
use crate::services::users::UsersService;

pub const INSUFFICIENT_GEMS: &str = "insufficient gems";
pub const INSUFFICIENT_COINS: &str = "insufficient coins";
pub const BALANCE_OVERFLOW: &str = "balance overflow";

/// Subtract `price` from `balances`, gems checked first. Nothing is
/// subtracted unless both currencies cover the price.
pub fn debit(balances: Balances, price: Balances) -> ServiceResult<Balances> {
    if balances.gems < price.gems {
        return Err(ServiceError::invalid(INSUFFICIENT_GEMS));
    }
    if balances.coins < price.coins {
        return Err(ServiceError::invalid(INSUFFICIENT_COINS));
    }
    Ok(Balances {
        coins: balances.coins - price.coins,
        gems: balances.gems - price.gems,
    })
}

/// Add `amount` to `balances`, refusing to wrap.
pub fn credit(balances: Balances, amount: Balances) -> ServiceResult<Balances> {
    let coins = balances.coins.checked_add(amount.coins);
    let gems = balances.gems.checked_add(amount.gems);
    match (coins, gems) {
        (Some(coins), Some(gems)) => Ok(Balances { coins, gems }),
        _ => Err(ServiceError::invalid(BALANCE_OVERFLOW)),
    }
}

impl StoreService {
    /// Charge the user the item's active price and record the possession.
    pub async fn buy_by_user(
        &self,
        claims: &GameClaims,
        user_id: &str,
        item_id: &str,
    ) -> ServiceResult<Balances> {
        info!("Buying item {} for user {}", item_id, user_id);
        authorize(claims, Policy::SelfOrAdmin, user_id)?;

        let mut tx = self
            .db
            .begin()
            .await
            .map_err(|e| storage("Could not proceed with the operation", e))?;

        users::lock_user(&mut *tx, user_id)
            .await
            .map_err(|e| storage("Could not find user", e))?;

        let user = users::get_user_by_id(&mut *tx, user_id)
            .await
            .map_err(|e| storage("Could not find user", e))?
            .ok_or_else(|| {
                warn!("Buy rejected: user {} not found", user_id);
                ServiceError::not_found("User not found")
            })?;

        let item = store_items::get_item_by_id(&mut *tx, item_id)
            .await
            .map_err(|e| storage("Could not find item", e))?
            .ok_or_else(|| {
                warn!("Buy rejected: item {} not found", item_id);
                ServiceError::not_found("Item not found")
            })?;

        let price = item.active_price();
        let remaining = debit(user.balances(), price).inspect_err(|e| {
            warn!(
                "Buy rejected for user {} item {}: {} (has {:?}, needs {:?})",
                user_id,
                item_id,
                e,
                user.balances(),
                price
            );
        })?;

        users::set_balances(&mut *tx, user_id, remaining, get_timestamp())
            .await
            .map_err(|e| storage("Could not proceed with the operation", e))?;

        let inserted = possessions::insert_possession(&mut *tx, user_id, item_id)
            .await
            .map_err(|e| storage("Could not proceed with the operation", e))?;
        if !inserted {
            warn!("User {} bought item {} they already own", user_id, item_id);
        }

        tx.commit()
            .await
            .map_err(|e| storage("Could not proceed with the operation", e))?;

        info!(
            "User {} bought item {} for {} coins / {} gems",
            user_id, item_id, price.coins, price.gems
        );
        Ok(remaining)
    }

    /// Remove the item from the user's possessions and refund its active
    /// price. Callers are admins or services (checked at the call level).
    pub async fn throw_away_by_user(&self, user_id: &str, item_id: &str) -> ServiceResult<Balances> {
        info!("Throwing away item {} of user {}", item_id, user_id);

        let mut tx = self
            .db
            .begin()
            .await
            .map_err(|e| storage("Could not proceed with the operation", e))?;

        users::lock_user(&mut *tx, user_id)
            .await
            .map_err(|e| storage("Could not find user", e))?;

        let user = users::get_user_by_id(&mut *tx, user_id)
            .await
            .map_err(|e| storage("Could not find user", e))?
            .ok_or_else(|| ServiceError::not_found("User not found"))?;

        let item = store_items::get_item_by_id(&mut *tx, item_id)
            .await
            .map_err(|e| storage("Could not find item", e))?
            .ok_or_else(|| ServiceError::not_found("Item not found"))?;

        let removed = possessions::delete_possession(&mut *tx, user_id, item_id)
            .await
            .map_err(|e| storage("Could not proceed with the operation", e))?;
        if removed == 0 {
            warn!("User {} does not own item {}", user_id, item_id);
            return Err(ServiceError::not_found("Item not possessed by user"));
        }

        let refunded = credit(user.balances(), item.active_price())?;
        users::set_balances(&mut *tx, user_id, refunded, get_timestamp())
            .await
            .map_err(|e| storage("Could not proceed with the operation", e))?;

        tx.commit()
            .await
            .map_err(|e| storage("Could not proceed with the operation", e))?;

        info!("User {} threw away item {}", user_id, item_id);
        Ok(refunded)
    }
}

impl UsersService {
    /// Add currencies to a user named by id, name or email. Callers are
    /// admins or services (checked at the call level).
    pub async fn grant_currencies(
        &self,
        identifier: &str,
        grant: &GrantCurrenciesRequest,
    ) -> ServiceResult<Balances> {
        info!(
            "Granting {} coins / {} gems to {}",
            grant.add_coins, grant.add_gems, identifier
        );

        if grant.add_coins < 0 || grant.add_gems < 0 {
            return Err(ServiceError::invalid("Granted amounts must not be negative"));
        }

        let user = users::find_user_by_identifier(&self.db, identifier)
            .await
            .map_err(|e| storage("Could not find user", e))?
            .ok_or_else(|| ServiceError::not_found("User not found"))?;

        let mut tx = self
            .db
            .begin()
            .await
            .map_err(|e| storage("Could not update user", e))?;

        if users::lock_user(&mut *tx, &user.id)
            .await
            .map_err(|e| storage("Could not update user", e))?
            == 0
        {
            return Err(ServiceError::not_found("User not found"));
        }

        let current = users::get_user_by_id(&mut *tx, &user.id)
            .await
            .map_err(|e| storage("Could not update user", e))?
            .ok_or_else(|| ServiceError::not_found("User not found"))?;

        let granted = credit(
            current.balances(),
            Balances {
                coins: grant.add_coins,
                gems: grant.add_gems,
            },
        )?;

        users::set_balances(&mut *tx, &user.id, granted, get_timestamp())
            .await
            .map_err(|e| storage("Could not update user", e))?;

        tx.commit()
            .await
            .map_err(|e| storage("Could not update user", e))?;

        Ok(granted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn b(coins: i64, gems: i64) -> Balances {
        Balances { coins, gems }
    }

    #[test]
    fn debit_subtracts_both_currencies() {
        assert_eq!(debit(b(1000, 100), b(100, 0)).unwrap(), b(900, 100));
    }

    #[test]
    fn gems_are_checked_before_coins() {
        let err = debit(b(0, 0), b(10, 10)).unwrap_err();
        assert_eq!(err, ServiceError::invalid(INSUFFICIENT_GEMS));
    }

    #[test]
    fn short_on_coins_only() {
        let err = debit(b(5, 100), b(10, 10)).unwrap_err();
        assert_eq!(err, ServiceError::invalid(INSUFFICIENT_COINS));
    }

    #[test]
    fn exact_balance_is_enough() {
        assert_eq!(debit(b(10, 10), b(10, 10)).unwrap(), b(0, 0));
    }

    #[test]
    fn credit_refuses_to_overflow() {
        let err = credit(b(i64::MAX, 0), b(1, 0)).unwrap_err();
        assert_eq!(err, ServiceError::invalid(BALANCE_OVERFLOW));
    }

    proptest! {
        #[test]
        fn debit_never_goes_negative(
            coins in 0i64..1_000_000, gems in 0i64..1_000_000,
            pc in 0i64..1_000_000, pg in 0i64..1_000_000,
        ) {
            match debit(b(coins, gems), b(pc, pg)) {
                Ok(left) => {
                    prop_assert!(left.coins >= 0 && left.gems >= 0);
                    prop_assert_eq!(left, b(coins - pc, gems - pg));
                }
                Err(_) => prop_assert!(coins < pc || gems < pg),
            }
        }

        #[test]
        fn credit_then_debit_restores(
            coins in 0i64..1_000_000, gems in 0i64..1_000_000,
            ac in 0i64..1_000_000, ag in 0i64..1_000_000,
        ) {
            let credited = credit(b(coins, gems), b(ac, ag)).unwrap();
            prop_assert_eq!(debit(credited, b(ac, ag)).unwrap(), b(coins, gems));
        }
    }
}
