//! Possession listing and the per-(user, item type) equip state machine.
//!
//! ```text
//!   NoneEquipped ──equip(I)──▶ Equipped(I)
//!   Equipped(J)  ──equip(I)──▶ Equipped(I)   (J de-equipped in the same tx)
//!   Equipped(I)  ──equip(I)──▶ Equipped(I)   (no writes)
//! ```

use tracing::{debug, error, info, warn};

use shared::types::{GameClaims, UserItemInfo};

use crate::auth::{Policy, authorize};
use crate::database::{possessions, users};
use crate::error::{ServiceError, ServiceResult, storage};
use crate::services::store_items::StoreService;

pub const NOT_POSSESSED: &str = "Item not possessed by user";

/// What a user has equipped in one item type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EquipState {
    NoneEquipped,
    Equipped(String),
    /// More than one equipped item of the type. Never written by this
    /// service; reported as a storage invariant failure.
    Corrupted(Vec<String>),
}

/// The writes needed to reach `Equipped(target)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EquipTransition {
    AlreadyEquipped,
    Equip,
    Swap { previous: String },
}

impl EquipState {
    pub fn from_equipped(mut ids: Vec<String>) -> Self {
        match ids.len() {
            0 => Self::NoneEquipped,
            1 => Self::Equipped(ids.remove(0)),
            _ => Self::Corrupted(ids),
        }
    }

    pub fn transition_to(&self, target: &str) -> ServiceResult<EquipTransition> {
        match self {
            Self::NoneEquipped => Ok(EquipTransition::Equip),
            Self::Equipped(current) if current == target => Ok(EquipTransition::AlreadyEquipped),
            Self::Equipped(current) => Ok(EquipTransition::Swap {
                previous: current.clone(),
            }),
            Self::Corrupted(ids) => {
                error!("Several items of one type equipped at once: {:?}", ids);
                Err(ServiceError::Internal("Could not equip item".into()))
            }
        }
    }
}

impl StoreService {
    /// Make `item_id` the user's equipped item of its type.
    pub async fn equip_by_user(
        &self,
        claims: &GameClaims,
        user_id: &str,
        item_id: &str,
    ) -> ServiceResult<()> {
        info!("Equipping item {} for user {}", item_id, user_id);
        authorize(claims, Policy::SelfOrAdmin, user_id)?;

        let item = self.load(item_id).await?;

        // Fast path: already equipped means nothing to write.
        let equipped = possessions::equipped_of_type(&self.db, user_id, item.item_type)
            .await
            .map_err(|e| storage("Could not equip item", e))?;
        if EquipState::from_equipped(equipped).transition_to(&item.id)?
            == EquipTransition::AlreadyEquipped
        {
            debug!("Item {} has been already equipped by {}", item.id, user_id);
            return Ok(());
        }

        let mut tx = self
            .db
            .begin()
            .await
            .map_err(|e| storage("Could not equip item", e))?;

        possessions::lock_possessions_of_type(&mut *tx, user_id, item.item_type)
            .await
            .map_err(|e| storage("Could not equip item", e))?;

        // Re-read under the lock: a concurrent equip may have committed
        // since the fast path looked.
        let equipped = possessions::equipped_of_type(&mut *tx, user_id, item.item_type)
            .await
            .map_err(|e| storage("Could not equip item", e))?;

        match EquipState::from_equipped(equipped).transition_to(&item.id)? {
            EquipTransition::AlreadyEquipped => {
                debug!("Item {} was equipped concurrently", item.id);
                return Ok(());
            }
            EquipTransition::Swap { previous } => {
                possessions::set_equipped(&mut *tx, user_id, &previous, false)
                    .await
                    .map_err(|e| storage("Could not deequip item", e))?;
                debug!("De-equipped item {} of user {}", previous, user_id);
            }
            EquipTransition::Equip => {}
        }

        let updated = possessions::set_equipped(&mut *tx, user_id, &item.id, true)
            .await
            .map_err(|e| storage("Could not equip item", e))?;
        if updated == 0 {
            warn!("User {} tried to equip item {} they do not own", user_id, item.id);
            return Err(ServiceError::not_found(NOT_POSSESSED));
        }

        tx.commit()
            .await
            .map_err(|e| storage("Could not equip item", e))?;

        info!("User {} equipped item {}", user_id, item.id);
        Ok(())
    }

    pub async fn get_user_items_ids(
        &self,
        claims: &GameClaims,
        user_id: &str,
    ) -> ServiceResult<Vec<UserItemInfo>> {
        debug!("GetUserItemsIds for {}", user_id);
        self.user_items(claims, user_id, false).await
    }

    pub async fn get_equipped_user_items_ids(
        &self,
        claims: &GameClaims,
        user_id: &str,
    ) -> ServiceResult<Vec<UserItemInfo>> {
        debug!("GetEquippedUserItemsIds for {}", user_id);
        self.user_items(claims, user_id, true).await
    }

    async fn user_items(
        &self,
        claims: &GameClaims,
        user_id: &str,
        equipped_only: bool,
    ) -> ServiceResult<Vec<UserItemInfo>> {
        authorize(claims, Policy::SelfOrAdminOrService, user_id)?;

        users::get_user_by_id(&self.db, user_id)
            .await
            .map_err(|e| storage("Could not find user", e))?
            .ok_or_else(|| ServiceError::not_found("User not found"))?;

        possessions::list_user_items(&self.db, user_id, equipped_only)
            .await
            .map_err(|e| storage("Could not fetch user items", e))
    }
}
