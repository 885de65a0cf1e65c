#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Geocoin.

pub mod economy;
mod player;
mod registry;

pub use player::Player;
pub use registry::{CacheRegistry, SpawnDecision};

use geocoin_core::{
    neighborhood, Cell, CellHash, Command, EconomyError, Event, GameConfig, PlayerSnapshot,
    Position, RegistrySnapshot, Token, WELCOME_BANNER,
};
use geocoin_oracle::Oracle;

/// Represents the authoritative state of a single game session.
#[derive(Clone, Debug)]
pub struct World {
    banner: &'static str,
    config: GameConfig,
    registry: CacheRegistry,
    player: Player,
    interaction: Option<CellHash>,
}

impl World {
    /// Creates a fresh session with no caches and the player at the configured spawn.
    #[must_use]
    pub fn new(config: GameConfig) -> Self {
        let player = PlayerSnapshot::at(config.spawn);
        Self::from_snapshots(config, RegistrySnapshot::default(), player)
    }

    /// Rebuilds a session from persisted registry and player state.
    #[must_use]
    pub fn from_snapshots(
        config: GameConfig,
        registry: RegistrySnapshot,
        player: PlayerSnapshot,
    ) -> Self {
        let oracle = Oracle::new(config.oracle_seed);
        Self {
            banner: WELCOME_BANNER,
            registry: CacheRegistry::restore(oracle, config.spawn_probability, registry),
            player: Player::from_snapshot(player),
            interaction: None,
            config,
        }
    }

    /// Captures the registry in its persisted shape.
    #[must_use]
    pub fn registry_snapshot(&self) -> RegistrySnapshot {
        self.registry.snapshot()
    }

    /// Captures the player in its persisted shape.
    #[must_use]
    pub fn player_snapshot(&self) -> PlayerSnapshot {
        self.player.snapshot()
    }

    fn player_cell(&self) -> Cell {
        self.player.position().cell(self.config.tile_degrees)
    }

    fn relocate(&mut self, position: Position, out_events: &mut Vec<Event>) {
        if !position.lat.is_finite() || !position.lng.is_finite() {
            tracing::warn!(lat = position.lat, lng = position.lng, "ignoring non-finite position");
            return;
        }
        if let Some(open) = self.interaction {
            tracing::debug!(%open, "movement suppressed while a cache is open");
            out_events.push(Event::MovementSuppressed { open });
            return;
        }

        let from = self.player.move_to(position);
        out_events.push(Event::PlayerMoved {
            from,
            to: position,
            cell: self.player_cell(),
        });
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ScanNeighborhood { center, radius } => {
            out_events.push(Event::ScanStarted { center });
            let mut spawned = 0u32;
            for cell in neighborhood(center, radius) {
                let decision = world.registry.consider_spawn(cell);
                if decision.spawned {
                    spawned = spawned.saturating_add(1);
                    out_events.push(Event::CacheSpawned {
                        cell,
                        hash: decision.hash,
                        newly_registered: decision.newly_registered,
                    });
                }
            }
            tracing::trace!(%center, spawned, "scanned neighborhood");
            out_events.push(Event::ScanCompleted { center, spawned });
        }
        Command::MovePlayer { direction } => {
            let destination = direction.step(world.player.position(), world.config.tile_degrees);
            world.relocate(destination, out_events);
        }
        Command::RelocatePlayer { position } => world.relocate(position, out_events),
        Command::OpenCache { hash } => {
            if !world.registry.contains(hash) {
                out_events.push(Event::InteractionRejected {
                    hash,
                    reason: EconomyError::NotFound,
                });
                return;
            }
            match world.interaction.replace(hash) {
                Some(open) if open == hash => {}
                Some(open) => {
                    out_events.push(Event::CacheClosed { hash: open });
                    out_events.push(Event::CacheOpened { hash });
                }
                None => out_events.push(Event::CacheOpened { hash }),
            }
        }
        Command::CloseCache => {
            if let Some(hash) = world.interaction.take() {
                out_events.push(Event::CacheClosed { hash });
            }
        }
        Command::MintToken { hash } => {
            let result = economy::mint_to_inventory(&mut world.player, &mut world.registry, hash);
            out_events.push(economy_outcome(hash, result, |hash, token| {
                Event::TokenMinted { hash, token }
            }));
        }
        Command::DepositToken { hash } => {
            let result =
                economy::deposit_from_inventory(&mut world.player, &mut world.registry, hash);
            out_events.push(economy_outcome(hash, result, |hash, token| {
                Event::TokenDeposited { hash, token }
            }));
        }
        Command::WithdrawToken { hash } => {
            let result =
                economy::withdraw_to_inventory(&mut world.player, &mut world.registry, hash);
            out_events.push(economy_outcome(hash, result, |hash, token| {
                Event::TokenWithdrawn { hash, token }
            }));
        }
        Command::ResetGame => {
            world.registry.reset();
            world.player.reset();
            if let Some(hash) = world.interaction.take() {
                out_events.push(Event::CacheClosed { hash });
            }
            tracing::info!("game state reset");
            out_events.push(Event::GameReset {
                player_cell: world.player_cell(),
            });
        }
    }
}

fn economy_outcome(
    hash: CellHash,
    result: Result<Token, EconomyError>,
    success: fn(CellHash, Token) -> Event,
) -> Event {
    match result {
        Ok(token) => success(hash, token),
        Err(reason) => {
            tracing::info!(%hash, %reason, "economy operation refused");
            Event::EconomyRejected { hash, reason }
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use geocoin_core::{CacheSummary, Cell, CellHash, EconomyError, GameConfig};

    use super::{CacheRegistry, Player, World};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Provides read-only access to the session configuration.
    #[must_use]
    pub fn config(world: &World) -> &GameConfig {
        &world.config
    }

    /// Provides read-only access to the cache registry.
    #[must_use]
    pub fn registry(world: &World) -> &CacheRegistry {
        &world.registry
    }

    /// Provides read-only access to the player.
    #[must_use]
    pub fn player(world: &World) -> &Player {
        &world.player
    }

    /// Cell the player currently stands on.
    #[must_use]
    pub fn player_cell(world: &World) -> Cell {
        world.player_cell()
    }

    /// Cache whose interaction surface is open, if any.
    #[must_use]
    pub fn open_cache(world: &World) -> Option<CellHash> {
        world.interaction
    }

    /// Figures shown on the interaction surface of a cache.
    pub fn cache_summary(world: &World, hash: CellHash) -> Result<CacheSummary, EconomyError> {
        let mint_budget = world.registry.mint_budget(hash)?;
        let cell = world.registry.cell(hash).ok_or(EconomyError::NotFound)?;
        Ok(CacheSummary {
            hash,
            cell,
            mint_budget,
            ledger_size: world.registry.deposit_ledger(hash).len(),
            inventory_size: world.player.inventory().len(),
        })
    }

    /// Tokens in circulation: the inventory plus every deposit ledger.
    #[must_use]
    pub fn circulating_tokens(world: &World) -> usize {
        world.player.inventory().len() + world.registry.deposited_total()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geocoin_core::{center_of, MoveDirection};

    fn config_with(spawn_probability: f64) -> GameConfig {
        GameConfig {
            spawn_probability,
            spawn: center_of(Cell::new(0, 0), 1e-4),
            ..GameConfig::default()
        }
    }

    #[test]
    fn scan_reports_every_spawned_cell() {
        let mut world = World::new(config_with(1.0));
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ScanNeighborhood {
                center: Cell::new(0, 0),
                radius: 2,
            },
            &mut events,
        );

        assert_eq!(events.first(), Some(&Event::ScanStarted { center: Cell::new(0, 0) }));
        assert_eq!(
            events.last(),
            Some(&Event::ScanCompleted {
                center: Cell::new(0, 0),
                spawned: 16,
            })
        );
        assert_eq!(query::registry(&world).len(), 16);
    }

    #[test]
    fn rescanning_registers_nothing_new() {
        let mut world = World::new(config_with(1.0));
        let scan = Command::ScanNeighborhood {
            center: Cell::new(0, 0),
            radius: 1,
        };
        let mut events = Vec::new();
        apply(&mut world, scan.clone(), &mut events);
        events.clear();
        apply(&mut world, scan, &mut events);

        assert!(events.iter().all(|event| !matches!(
            event,
            Event::CacheSpawned {
                newly_registered: true,
                ..
            }
        )));
    }

    #[test]
    fn moving_north_enters_the_next_cell() {
        let mut world = World::new(config_with(0.0));
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::MovePlayer {
                direction: MoveDirection::North,
            },
            &mut events,
        );

        assert_eq!(query::player_cell(&world), Cell::new(1, 0));
        assert!(matches!(
            events.as_slice(),
            [Event::PlayerMoved { cell, .. }] if *cell == Cell::new(1, 0)
        ));
        let location = query::player(&world).location();
        assert_eq!(location.previous, center_of(Cell::new(0, 0), 1e-4));
    }

    #[test]
    fn non_finite_positions_are_ignored() {
        let mut world = World::new(config_with(0.0));
        let before = world.player_snapshot();
        let mut events = Vec::new();
        for position in [
            Position::new(f64::NAN, f64::NAN),
            Position::new(f64::INFINITY, 0.0),
            Position::new(0.0, f64::NEG_INFINITY),
        ] {
            apply(&mut world, Command::RelocatePlayer { position }, &mut events);
        }
        assert!(events.is_empty());
        assert_eq!(world.player_snapshot(), before);
    }

    #[test]
    fn open_cache_suppresses_movement() {
        let mut world = World::new(config_with(1.0));
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ScanNeighborhood {
                center: Cell::new(0, 0),
                radius: 1,
            },
            &mut events,
        );
        let hash = Cell::new(0, 0).cell_hash();
        events.clear();

        apply(&mut world, Command::OpenCache { hash }, &mut events);
        apply(
            &mut world,
            Command::RelocatePlayer {
                position: Position::new(1.0, 1.0),
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![
                Event::CacheOpened { hash },
                Event::MovementSuppressed { open: hash },
            ]
        );
        assert_eq!(query::player_cell(&world), Cell::new(0, 0));

        events.clear();
        apply(&mut world, Command::CloseCache, &mut events);
        apply(
            &mut world,
            Command::MovePlayer {
                direction: MoveDirection::East,
            },
            &mut events,
        );
        assert_eq!(events.first(), Some(&Event::CacheClosed { hash }));
        assert_eq!(query::player_cell(&world), Cell::new(0, 1));
    }

    #[test]
    fn opening_another_cache_closes_the_first() {
        let mut world = World::new(config_with(1.0));
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ScanNeighborhood {
                center: Cell::new(0, 0),
                radius: 1,
            },
            &mut events,
        );
        let first = Cell::new(0, 0).cell_hash();
        let second = Cell::new(-1, -1).cell_hash();
        events.clear();

        apply(&mut world, Command::OpenCache { hash: first }, &mut events);
        apply(&mut world, Command::OpenCache { hash: second }, &mut events);
        assert_eq!(
            events,
            vec![
                Event::CacheOpened { hash: first },
                Event::CacheClosed { hash: first },
                Event::CacheOpened { hash: second },
            ]
        );
        assert_eq!(query::open_cache(&world), Some(second));
    }

    #[test]
    fn opening_unknown_cache_is_rejected() {
        let mut world = World::new(config_with(0.0));
        let mut events = Vec::new();
        let hash = Cell::new(3, 3).cell_hash();
        apply(&mut world, Command::OpenCache { hash }, &mut events);

        assert_eq!(
            events,
            vec![Event::InteractionRejected {
                hash,
                reason: EconomyError::NotFound,
            }]
        );
        assert_eq!(query::open_cache(&world), None);
    }

    #[test]
    fn rejected_economy_commands_report_reason() {
        let mut world = World::new(config_with(1.0));
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ScanNeighborhood {
                center: Cell::new(0, 0),
                radius: 1,
            },
            &mut events,
        );
        let hash = Cell::new(0, 0).cell_hash();
        events.clear();

        apply(&mut world, Command::DepositToken { hash }, &mut events);
        apply(&mut world, Command::WithdrawToken { hash }, &mut events);
        assert_eq!(
            events,
            vec![
                Event::EconomyRejected {
                    hash,
                    reason: EconomyError::EmptyInventory,
                },
                Event::EconomyRejected {
                    hash,
                    reason: EconomyError::EmptyLedger,
                },
            ]
        );
    }

    #[test]
    fn cache_summary_reflects_economy() {
        let mut world = World::new(config_with(1.0));
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ScanNeighborhood {
                center: Cell::new(0, 0),
                radius: 1,
            },
            &mut events,
        );
        let hash = Cell::new(0, 0).cell_hash();
        let before = query::cache_summary(&world, hash).expect("registered");

        apply(&mut world, Command::MintToken { hash }, &mut events);
        apply(&mut world, Command::MintToken { hash }, &mut events);
        apply(&mut world, Command::DepositToken { hash }, &mut events);
        let after = query::cache_summary(&world, hash).expect("registered");

        if before.mint_budget >= 2 {
            assert_eq!(after.mint_budget, before.mint_budget - 2);
            assert_eq!(after.ledger_size, 1);
            assert_eq!(after.inventory_size, 1);
        }
        assert_eq!(
            query::cache_summary(&world, Cell::new(9, 9).cell_hash()),
            Err(EconomyError::NotFound)
        );
    }

    #[test]
    fn reset_clears_state_and_reports_player_cell() {
        let mut world = World::new(config_with(1.0));
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ScanNeighborhood {
                center: Cell::new(0, 0),
                radius: 1,
            },
            &mut events,
        );
        let hash = Cell::new(0, 0).cell_hash();
        apply(&mut world, Command::MintToken { hash }, &mut events);
        apply(&mut world, Command::OpenCache { hash }, &mut events);
        events.clear();

        apply(&mut world, Command::ResetGame, &mut events);
        assert_eq!(
            events,
            vec![
                Event::CacheClosed { hash },
                Event::GameReset {
                    player_cell: Cell::new(0, 0),
                },
            ]
        );
        assert!(query::registry(&world).is_empty());
        assert_eq!(query::circulating_tokens(&world), 0);
        assert_eq!(query::open_cache(&world), None);
    }
}
