//! Player-facing token operations.
//!
//! Each operation moves a single token between the player's inventory and a
//! cache. Minting is the only way a token comes into existence and nothing
//! ever destroys one, so every minted token sits in exactly one inventory or
//! ledger at any time. Failed operations leave both sides untouched.

use geocoin_core::{CellHash, EconomyError, Token};

use crate::{player::Player, registry::CacheRegistry};

/// Moves the player's most recently acquired token into the cache's ledger.
pub fn deposit_from_inventory(
    player: &mut Player,
    registry: &mut CacheRegistry,
    hash: CellHash,
) -> Result<Token, EconomyError> {
    if !registry.contains(hash) {
        return Err(EconomyError::NotFound);
    }
    let token = player.pop_token().ok_or(EconomyError::EmptyInventory)?;
    registry.deposit(hash, token);
    tracing::debug!(%hash, %token, "deposited token");
    Ok(token)
}

/// Moves the cache's most recent deposit into the player's inventory.
pub fn withdraw_to_inventory(
    player: &mut Player,
    registry: &mut CacheRegistry,
    hash: CellHash,
) -> Result<Token, EconomyError> {
    let token = registry.withdraw(hash)?;
    player.push_token(token);
    tracing::debug!(%hash, %token, "withdrew token");
    Ok(token)
}

/// Mints a new token from the cache straight into the player's inventory.
pub fn mint_to_inventory(
    player: &mut Player,
    registry: &mut CacheRegistry,
    hash: CellHash,
) -> Result<Token, EconomyError> {
    let token = registry.mint(hash)?;
    player.push_token(token);
    tracing::debug!(%hash, %token, "minted token");
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geocoin_core::{Cell, Position};
    use geocoin_oracle::Oracle;

    fn setup() -> (Player, CacheRegistry, CellHash) {
        let player = Player::new(Position::new(0.0, 0.0));
        let mut registry = CacheRegistry::new(Oracle::default(), 1.0);
        let hash = registry.ensure_exists(Cell::new(0, 0));
        (player, registry, hash)
    }

    #[test]
    fn deposit_with_empty_inventory_changes_nothing() {
        let (mut player, mut registry, hash) = setup();
        let before = registry.snapshot();

        assert_eq!(
            deposit_from_inventory(&mut player, &mut registry, hash),
            Err(EconomyError::EmptyInventory)
        );
        assert!(player.inventory().is_empty());
        assert_eq!(registry.snapshot(), before);
    }

    #[test]
    fn deposit_offers_most_recent_token_first() {
        let (mut player, mut registry, hash) = setup();
        let first = mint_to_inventory(&mut player, &mut registry, hash).expect("mint");
        let second = mint_to_inventory(&mut player, &mut registry, hash).expect("mint");

        assert_eq!(
            deposit_from_inventory(&mut player, &mut registry, hash),
            Ok(second)
        );
        assert_eq!(player.inventory(), &[first]);
    }

    #[test]
    fn withdraw_right_after_deposit_returns_same_token() {
        let (mut player, mut registry, hash) = setup();
        let token = mint_to_inventory(&mut player, &mut registry, hash).expect("mint");
        let _ = deposit_from_inventory(&mut player, &mut registry, hash).expect("deposit");

        assert_eq!(
            withdraw_to_inventory(&mut player, &mut registry, hash),
            Ok(token)
        );
        assert_eq!(player.inventory(), &[token]);
        assert!(registry.deposit_ledger(hash).is_empty());
    }

    #[test]
    fn deposit_into_unknown_cache_keeps_token() {
        let (mut player, mut registry, hash) = setup();
        let token = mint_to_inventory(&mut player, &mut registry, hash).expect("mint");
        let unknown = Cell::new(50, 50).cell_hash();

        assert_eq!(
            deposit_from_inventory(&mut player, &mut registry, unknown),
            Err(EconomyError::NotFound)
        );
        assert_eq!(player.inventory(), &[token]);
    }

    #[test]
    fn withdraw_from_empty_ledger_fails() {
        let (mut player, mut registry, hash) = setup();
        assert_eq!(
            withdraw_to_inventory(&mut player, &mut registry, hash),
            Err(EconomyError::EmptyLedger)
        );
        assert!(player.inventory().is_empty());
    }
}
