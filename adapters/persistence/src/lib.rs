#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Saves and restores Geocoin sessions through a string-keyed store.
//!
//! Each piece of state lives under its own key and is decoded independently,
//! so a damaged value only loses that piece of state. Loading never fails:
//! problems are collected in a [`LoadReport`] and the affected key falls back
//! to its initial state.

mod store;

pub use store::{JsonFileStore, KeyValueStore, MemoryStore};

use anyhow::{Context, Result};
use geocoin_core::{
    Cell, CellHash, GameConfig, PlayerLocation, PlayerSnapshot, Position, RegistrySnapshot, Token,
};
use geocoin_world::World;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Keys under which session state is stored.
pub mod keys {
    /// Registered caches as `(hash, cell)` pairs.
    pub const CACHE: &str = "cache";
    /// Remaining mint budgets as `(hash, budget)` pairs.
    pub const TOKEN_COUNT: &str = "tokenCount";
    /// Deposit ledgers as `(hash, tokens)` pairs.
    pub const DEPOSIT_BOX: &str = "depositBox";
    /// Next mint serial per cache as `(hash, serial)` pairs.
    pub const MINT_SERIAL: &str = "mintSerial";
    /// Tokens held by the player.
    pub const INVENTORY: &str = "inventory";
    /// Current and previous player positions.
    pub const LOCATION: &str = "location";
    /// Positions the player visited.
    pub const POLY: &str = "poly";

    /// Every key written by a save.
    pub const ALL: [&str; 7] = [
        CACHE,
        TOKEN_COUNT,
        DEPOSIT_BOX,
        MINT_SERIAL,
        INVENTORY,
        LOCATION,
        POLY,
    ];
}

/// Problems encountered while loading a single key.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PersistenceError {
    /// The stored value could not be decoded.
    #[error("stored value for `{key}` is malformed: {message}")]
    Corrupt {
        /// Affected key.
        key: &'static str,
        /// Decoder diagnostic.
        message: String,
    },
    /// The store failed to produce the value.
    #[error("could not read `{key}`: {message}")]
    Unavailable {
        /// Affected key.
        key: &'static str,
        /// Store diagnostic.
        message: String,
    },
}

impl PersistenceError {
    /// Key the problem relates to.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::Corrupt { key, .. } | Self::Unavailable { key, .. } => key,
        }
    }
}

/// Summary of a load, listing keys that fell back to their initial state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    errors: Vec<PersistenceError>,
    restored: Vec<&'static str>,
}

impl LoadReport {
    /// Problems that forced a key back to its initial state.
    #[must_use]
    pub fn errors(&self) -> &[PersistenceError] {
        &self.errors
    }

    /// Keys that were present and decoded successfully.
    #[must_use]
    pub fn restored(&self) -> &[&'static str] {
        &self.restored
    }

    /// Reports whether every present key decoded successfully.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    fn record(&mut self, error: PersistenceError) {
        tracing::warn!(key = error.key(), %error, "falling back to initial state");
        self.errors.push(error);
    }
}

/// Writes every piece of session state into `store`.
pub fn save_world<S: KeyValueStore + ?Sized>(store: &mut S, world: &World) -> Result<()> {
    let registry = world.registry_snapshot();
    let player = world.player_snapshot();

    write_key(store, keys::CACHE, &registry.caches)?;
    write_key(store, keys::TOKEN_COUNT, &registry.mint_budgets)?;
    write_key(store, keys::DEPOSIT_BOX, &registry.deposit_ledgers)?;
    write_key(store, keys::MINT_SERIAL, &registry.mint_serials)?;
    write_key(store, keys::INVENTORY, &player.inventory)?;
    write_key(store, keys::LOCATION, &player.location)?;
    write_key(store, keys::POLY, &player.trail)?;

    tracing::debug!(caches = registry.caches.len(), "session saved");
    Ok(())
}

/// Rebuilds a session from `store`, falling back per key on problems.
pub fn load_world<S: KeyValueStore + ?Sized>(store: &S, config: GameConfig) -> (World, LoadReport) {
    let mut report = LoadReport::default();

    let registry = RegistrySnapshot {
        caches: read_key::<_, Vec<(CellHash, Cell)>>(store, keys::CACHE, &mut report)
            .unwrap_or_default(),
        mint_budgets: read_key::<_, Vec<(CellHash, u32)>>(store, keys::TOKEN_COUNT, &mut report)
            .unwrap_or_default(),
        mint_serials: read_key::<_, Vec<(CellHash, u32)>>(store, keys::MINT_SERIAL, &mut report)
            .unwrap_or_default(),
        deposit_ledgers: read_key::<_, Vec<(CellHash, Vec<Token>)>>(
            store,
            keys::DEPOSIT_BOX,
            &mut report,
        )
        .unwrap_or_default(),
    };

    let inventory = read_key::<_, Vec<Token>>(store, keys::INVENTORY, &mut report)
        .unwrap_or_default();
    let location = read_key::<_, PlayerLocation>(store, keys::LOCATION, &mut report)
        .unwrap_or_else(|| PlayerLocation::at(config.spawn));
    let trail = read_key::<_, Vec<Position>>(store, keys::POLY, &mut report)
        .filter(|trail| !trail.is_empty())
        .unwrap_or_else(|| vec![location.current]);

    let player = PlayerSnapshot {
        inventory,
        location,
        trail,
    };
    tracing::info!(
        caches = registry.caches.len(),
        inventory = player.inventory.len(),
        problems = report.errors.len(),
        "session loaded"
    );
    (World::from_snapshots(config, registry, player), report)
}

/// Deletes every stored piece of session state.
pub fn reset<S: KeyValueStore + ?Sized>(store: &mut S) -> Result<()> {
    store.clear().context("failed to clear saved session")
}

fn write_key<S, T>(store: &mut S, key: &'static str, value: &T) -> Result<()>
where
    S: KeyValueStore + ?Sized,
    T: Serialize + ?Sized,
{
    let encoded =
        serde_json::to_string(value).with_context(|| format!("failed to encode `{key}`"))?;
    store
        .set(key, encoded)
        .with_context(|| format!("failed to store `{key}`"))
}

fn read_key<S, T>(store: &S, key: &'static str, report: &mut LoadReport) -> Option<T>
where
    S: KeyValueStore + ?Sized,
    T: DeserializeOwned,
{
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(error) => {
            report.record(PersistenceError::Unavailable {
                key,
                message: format!("{error:#}"),
            });
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => {
            report.restored.push(key);
            Some(value)
        }
        Err(error) => {
            report.record(PersistenceError::Corrupt {
                key,
                message: error.to_string(),
            });
            None
        }
    }
}
