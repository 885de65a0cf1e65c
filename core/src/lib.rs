#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Geocoin engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.

pub mod grid;

use std::{fmt, str::FromStr};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

pub use grid::{bounds_of, cell_of, center_of, hash_of, neighborhood, Neighborhood};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Geocoin.";

/// Upper bound of the mint budget a cache receives on first touch.
pub const MAX_MINT_BUDGET: u32 = 25;

/// Number of committed scan batches the visibility window keeps materialised.
pub const VISIBILITY_WINDOW_CAPACITY: usize = 2;

const HASH_SEPARATOR: char = ':';

/// Discrete grid coordinate obtained by flooring a continuous position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    i: i32,
    j: i32,
}

impl Cell {
    /// Creates a new cell from its latitude and longitude indices.
    #[must_use]
    pub const fn new(i: i32, j: i32) -> Self {
        Self { i, j }
    }

    /// Latitude index of the cell.
    #[must_use]
    pub const fn i(&self) -> i32 {
        self.i
    }

    /// Longitude index of the cell.
    #[must_use]
    pub const fn j(&self) -> i32 {
        self.j
    }

    /// Returns the cell displaced by the provided offsets, saturating at the grid edge.
    #[must_use]
    pub const fn offset(self, di: i32, dj: i32) -> Self {
        Self {
            i: self.i.saturating_add(di),
            j: self.j.saturating_add(dj),
        }
    }

    /// Identity key under which caches and ledgers for this cell are stored.
    #[must_use]
    pub const fn cell_hash(self) -> CellHash {
        CellHash {
            i: self.i,
            j: self.j,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.i, self.j)
    }
}

/// Identity of a cache, derived structurally from its cell.
///
/// The textual form is `"{i}:{j}"`. A decimal integer never contains `:`, so
/// two distinct cells can never share a textual hash.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellHash {
    i: i32,
    j: i32,
}

impl CellHash {
    /// Cell the hash was derived from.
    #[must_use]
    pub const fn cell(&self) -> Cell {
        Cell::new(self.i, self.j)
    }
}

impl From<Cell> for CellHash {
    fn from(cell: Cell) -> Self {
        cell.cell_hash()
    }
}

impl fmt::Display for CellHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{HASH_SEPARATOR}{}", self.i, self.j)
    }
}

/// Error returned when a string does not encode a [`CellHash`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("'{value}' is not a cell hash")]
pub struct ParseCellHashError {
    value: String,
}

impl FromStr for CellHash {
    type Err = ParseCellHashError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseCellHashError {
            value: value.to_owned(),
        };
        let (i, j) = value.split_once(HASH_SEPARATOR).ok_or_else(invalid)?;
        let i = i.parse::<i32>().map_err(|_| invalid())?;
        let j = j.parse::<i32>().map_err(|_| invalid())?;
        Ok(Self { i, j })
    }
}

impl Serialize for CellHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CellHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(de::Error::custom)
    }
}

/// Continuous geographic position expressed in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

impl Position {
    /// Creates a new position.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Cell containing the position for the provided tile size.
    #[must_use]
    pub fn cell(&self, tile_degrees: f64) -> Cell {
        cell_of(self.lat, self.lng, tile_degrees)
    }
}

/// Axis-aligned rectangle covering a single tile.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Southern edge, inclusive.
    pub lat_min: f64,
    /// Western edge, inclusive.
    pub lng_min: f64,
    /// Northern edge, exclusive.
    pub lat_max: f64,
    /// Eastern edge, exclusive.
    pub lng_max: f64,
}

impl Bounds {
    /// Reports whether the position lies inside the half-open rectangle.
    #[must_use]
    pub fn contains(&self, position: Position) -> bool {
        (self.lat_min..self.lat_max).contains(&position.lat)
            && (self.lng_min..self.lng_max).contains(&position.lng)
    }
}

/// Identity-bearing collectible created by minting from a cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Token {
    origin: Cell,
    serial: u32,
}

impl Token {
    /// Creates a token minted at `origin` with the provided serial.
    #[must_use]
    pub const fn new(origin: Cell, serial: u32) -> Self {
        Self { origin, serial }
    }

    /// Cell of the cache that minted the token.
    #[must_use]
    pub const fn origin(&self) -> Cell {
        self.origin
    }

    /// Serial assigned by the minting cache.
    #[must_use]
    pub const fn serial(&self) -> u32 {
        self.serial
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{{}:{}:{}}}",
            self.origin.i(),
            self.origin.j(),
            self.serial
        )
    }
}

/// Cardinal directions the player may step in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MoveDirection {
    /// Toward increasing latitude.
    North,
    /// Toward increasing longitude.
    East,
    /// Toward decreasing latitude.
    South,
    /// Toward decreasing longitude.
    West,
}

impl MoveDirection {
    /// Position reached after stepping one tile from `origin`.
    #[must_use]
    pub fn step(self, origin: Position, tile_degrees: f64) -> Position {
        match self {
            Self::North => Position::new(origin.lat + tile_degrees, origin.lng),
            Self::East => Position::new(origin.lat, origin.lng + tile_degrees),
            Self::South => Position::new(origin.lat - tile_degrees, origin.lng),
            Self::West => Position::new(origin.lat, origin.lng - tile_degrees),
        }
    }
}

/// Current and previous positions of the player.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerLocation {
    /// Where the player stands now.
    pub current: Position,
    /// Where the player stood before the most recent move.
    pub previous: Position,
}

impl PlayerLocation {
    /// Location of a player that has not moved yet.
    #[must_use]
    pub const fn at(position: Position) -> Self {
        Self {
            current: position,
            previous: position,
        }
    }
}

/// Tunable parameters of a game session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameConfig {
    /// Edge length of a grid tile in degrees.
    pub tile_degrees: f64,
    /// Half-width of the square scanned around the player, in tiles.
    pub neighborhood_radius: u32,
    /// Probability that a scanned cell hosts a cache.
    pub spawn_probability: f64,
    /// Seed mixed into every oracle key.
    pub oracle_seed: u64,
    /// Where a fresh player starts.
    pub spawn: Position,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tile_degrees: 1e-4,
            neighborhood_radius: 8,
            spawn_probability: 0.05,
            oracle_seed: 0,
            spawn: Position::new(36.989_493_795_784_01, -122.062_771_285_485_04),
        }
    }
}

impl GameConfig {
    /// Checks that the parameters describe a playable session.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.tile_degrees.is_finite() || self.tile_degrees <= 0.0 {
            return Err(ConfigError::InvalidTileDegrees(self.tile_degrees));
        }
        if !(0.0..=1.0).contains(&self.spawn_probability) {
            return Err(ConfigError::InvalidSpawnProbability(self.spawn_probability));
        }
        if self.neighborhood_radius == 0 {
            return Err(ConfigError::ZeroRadius);
        }
        if !self.spawn.lat.is_finite() || !self.spawn.lng.is_finite() {
            return Err(ConfigError::InvalidSpawn);
        }
        Ok(())
    }
}

/// Reasons a [`GameConfig`] is rejected.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// The tile size is not a positive finite number.
    #[error("tile_degrees must be positive and finite, got {0}")]
    InvalidTileDegrees(f64),
    /// The spawn probability lies outside `[0, 1]`.
    #[error("spawn_probability must lie within [0, 1], got {0}")]
    InvalidSpawnProbability(f64),
    /// A zero radius would never scan any cell.
    #[error("neighborhood_radius must be at least 1")]
    ZeroRadius,
    /// The spawn position is not finite.
    #[error("spawn position must be finite")]
    InvalidSpawn,
}

/// Expected, recoverable failures of economy and registry operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum EconomyError {
    /// The cache has no mint budget left.
    #[error("no tokens available for mint")]
    InsufficientBudget,
    /// The cache's deposit ledger holds no tokens.
    #[error("no token in cache")]
    EmptyLedger,
    /// The player holds no tokens.
    #[error("no token in inventory")]
    EmptyInventory,
    /// No cache is registered under the hash.
    #[error("no cache registered for this cell")]
    NotFound,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Runs the spawn decision over the neighborhood of `center`.
    ScanNeighborhood {
        /// Cell the scan window is centred on.
        center: Cell,
        /// Half-width of the scan window in tiles.
        radius: u32,
    },
    /// Steps the player one tile in the provided direction.
    MovePlayer {
        /// Direction of the step.
        direction: MoveDirection,
    },
    /// Places the player at a position reported by a geolocation fix.
    RelocatePlayer {
        /// Reported position.
        position: Position,
    },
    /// Opens the interaction surface of a cache.
    OpenCache {
        /// Cache to interact with.
        hash: CellHash,
    },
    /// Closes the open interaction surface, if any.
    CloseCache,
    /// Mints a token from the cache into the player's inventory.
    MintToken {
        /// Minting cache.
        hash: CellHash,
    },
    /// Moves the player's most recent token into the cache's ledger.
    DepositToken {
        /// Receiving cache.
        hash: CellHash,
    },
    /// Moves the cache's most recent deposit into the player's inventory.
    WithdrawToken {
        /// Cache to withdraw from.
        hash: CellHash,
    },
    /// Discards every cache, ledger and held token.
    ResetGame,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// The player changed position.
    PlayerMoved {
        /// Position before the move.
        from: Position,
        /// Position after the move.
        to: Position,
        /// Cell containing the new position.
        cell: Cell,
    },
    /// A move was ignored because an interaction surface is open.
    MovementSuppressed {
        /// Cache whose surface blocked the move.
        open: CellHash,
    },
    /// A neighborhood scan began.
    ScanStarted {
        /// Cell the scan is centred on.
        center: Cell,
    },
    /// The oracle placed a cache on a scanned cell.
    CacheSpawned {
        /// Cell hosting the cache.
        cell: Cell,
        /// Identity of the cache.
        hash: CellHash,
        /// Whether this scan registered the cache for the first time.
        newly_registered: bool,
    },
    /// A neighborhood scan finished.
    ScanCompleted {
        /// Cell the scan was centred on.
        center: Cell,
        /// Number of cells that hosted a cache.
        spawned: u32,
    },
    /// An interaction surface opened.
    CacheOpened {
        /// Cache bound to the surface.
        hash: CellHash,
    },
    /// An interaction surface closed.
    CacheClosed {
        /// Cache that was bound to the surface.
        hash: CellHash,
    },
    /// Opening an interaction surface failed.
    InteractionRejected {
        /// Requested cache.
        hash: CellHash,
        /// Why the request failed.
        reason: EconomyError,
    },
    /// A token was minted into the player's inventory.
    TokenMinted {
        /// Minting cache.
        hash: CellHash,
        /// Newly created token.
        token: Token,
    },
    /// A token moved from the inventory into a ledger.
    TokenDeposited {
        /// Receiving cache.
        hash: CellHash,
        /// Moved token.
        token: Token,
    },
    /// A token moved from a ledger into the inventory.
    TokenWithdrawn {
        /// Source cache.
        hash: CellHash,
        /// Moved token.
        token: Token,
    },
    /// An economy operation was refused without changing state.
    EconomyRejected {
        /// Targeted cache.
        hash: CellHash,
        /// Why the operation failed.
        reason: EconomyError,
    },
    /// All game state was discarded.
    GameReset {
        /// Cell the player stands on after the reset.
        player_cell: Cell,
    },
}

impl Event {
    /// Reports whether the event reflects state that must be persisted.
    #[must_use]
    pub const fn is_persistent_change(&self) -> bool {
        match self {
            Self::PlayerMoved { .. }
            | Self::TokenMinted { .. }
            | Self::TokenDeposited { .. }
            | Self::TokenWithdrawn { .. }
            | Self::GameReset { .. } => true,
            Self::CacheSpawned {
                newly_registered, ..
            } => *newly_registered,
            _ => false,
        }
    }
}

/// Figures displayed on a cache's interaction surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheSummary {
    /// Identity of the cache.
    pub hash: CellHash,
    /// Cell hosting the cache.
    pub cell: Cell,
    /// Tokens the cache may still mint.
    pub mint_budget: u32,
    /// Tokens currently deposited in the cache.
    pub ledger_size: usize,
    /// Tokens currently held by the player.
    pub inventory_size: usize,
}

/// Serialisable image of the cache registry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    /// Registered caches.
    pub caches: Vec<(CellHash, Cell)>,
    /// Remaining mint budget per cache.
    pub mint_budgets: Vec<(CellHash, u32)>,
    /// Next serial each cache will assign.
    pub mint_serials: Vec<(CellHash, u32)>,
    /// Deposited tokens per cache, oldest first.
    pub deposit_ledgers: Vec<(CellHash, Vec<Token>)>,
}

/// Serialisable image of the player.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    /// Held tokens, oldest first.
    pub inventory: Vec<Token>,
    /// Current and previous positions.
    pub location: PlayerLocation,
    /// Positions visited, oldest first.
    pub trail: Vec<Position>,
}

impl PlayerSnapshot {
    /// Snapshot of a fresh player standing at `spawn`.
    #[must_use]
    pub fn at(spawn: Position) -> Self {
        Self {
            inventory: Vec::new(),
            location: PlayerLocation::at(spawn),
            trail: vec![spawn],
        }
    }
}
