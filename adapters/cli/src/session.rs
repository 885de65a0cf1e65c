//! Interactive session wiring the world, its systems and the adapters.

use geocoin_core::{CellHash, Command, Event, GameConfig};
use geocoin_oracle::Oracle;
use geocoin_persistence::{load_world, reset, save_world, KeyValueStore};
use geocoin_rendering::{render_ascii, CachePanel, MapSurface, RectHandle};
use geocoin_system_spawning::{Config as SpawningConfig, Spawning};
use geocoin_system_visibility::VisibilityWindow;
use geocoin_world::{self as world, query, World};

use crate::{
    repl::{ReplCommand, HELP},
    save_transfer::SaveTransfer,
};

const RECENT_TOKENS: usize = 5;

/// A running game together with its storage and map.
pub(crate) struct Session {
    config: GameConfig,
    world: World,
    spawning: Spawning,
    window: VisibilityWindow<RectHandle>,
    surface: MapSurface,
    store: Box<dyn KeyValueStore>,
}

impl Session {
    /// Loads the stored session and scans around the player.
    ///
    /// Returns the session with the lines to show on startup.
    pub(crate) fn start(config: GameConfig, store: Box<dyn KeyValueStore>) -> (Self, Vec<String>) {
        let (world, report) = load_world(&*store, config.clone());
        let mut lines = vec![query::welcome_banner(&world).to_owned()];
        for error in report.errors() {
            lines.push(format!("warning: {error}; that part of the save starts fresh"));
        }

        let mut session = Self {
            spawning: Spawning::new(SpawningConfig::new(config.neighborhood_radius)),
            window: VisibilityWindow::new(),
            surface: MapSurface::new(Oracle::new(config.oracle_seed)),
            config,
            world,
            store,
        };
        lines.extend(session.rescan());
        (session, lines)
    }

    /// Runs one player command and returns the lines to print.
    pub(crate) fn execute(&mut self, command: ReplCommand) -> Vec<String> {
        match command {
            ReplCommand::Move(direction) => self.run(Command::MovePlayer { direction }),
            ReplCommand::Goto(position) => self.run(Command::RelocatePlayer { position }),
            ReplCommand::Open(cell) => {
                let mut lines = self.run(Command::OpenCache {
                    hash: cell.cell_hash(),
                });
                lines.extend(self.panel());
                lines
            }
            ReplCommand::Close => {
                let lines = self.run(Command::CloseCache);
                if lines.is_empty() {
                    vec!["No cache is open.".to_owned()]
                } else {
                    lines
                }
            }
            ReplCommand::Mint => self.economy(|hash| Command::MintToken { hash }),
            ReplCommand::Deposit => self.economy(|hash| Command::DepositToken { hash }),
            ReplCommand::Withdraw => self.economy(|hash| Command::WithdrawToken { hash }),
            ReplCommand::Status => self.status(),
            ReplCommand::Map => {
                render_ascii(
                    &self.surface,
                    query::player_cell(&self.world),
                    self.config.neighborhood_radius,
                )
                .lines()
                .map(str::to_owned)
                .collect()
            }
            ReplCommand::Reset => {
                if let Err(error) = reset(&mut *self.store) {
                    tracing::warn!(error = %format!("{error:#}"), "failed to clear saved session");
                }
                self.run(Command::ResetGame)
            }
            ReplCommand::Export => {
                let transfer = SaveTransfer {
                    registry: self.world.registry_snapshot(),
                    player: self.world.player_snapshot(),
                };
                match transfer.encode() {
                    Ok(encoded) => vec![encoded],
                    Err(error) => vec![format!("export failed: {error}")],
                }
            }
            ReplCommand::Import(encoded) => match SaveTransfer::decode(&encoded) {
                Ok(transfer) => {
                    self.world =
                        World::from_snapshots(self.config.clone(), transfer.registry, transfer.player);
                    self.window.reset_all(&mut self.surface);
                    let mut lines = vec!["Session imported.".to_owned()];
                    lines.extend(self.rescan());
                    self.persist();
                    lines
                }
                Err(error) => vec![format!("import failed: {error}")],
            },
            ReplCommand::Help => HELP.lines().map(str::to_owned).collect(),
            ReplCommand::Quit => Vec::new(),
        }
    }

    fn rescan(&mut self) -> Vec<String> {
        let mut scans = Vec::new();
        self.spawning
            .initial_scan(query::player_cell(&self.world), &mut scans);
        scans
            .into_iter()
            .flat_map(|command| self.run(command))
            .collect()
    }

    fn economy(&mut self, command: fn(CellHash) -> Command) -> Vec<String> {
        let Some(hash) = query::open_cache(&self.world) else {
            return vec!["Open a cache first.".to_owned()];
        };
        let mut lines = self.run(command(hash));
        lines.extend(self.panel());
        lines
    }

    /// Applies `command` and lets the systems react until nothing is pending.
    fn pump(&mut self, command: Command) -> Vec<Event> {
        let mut log = Vec::new();
        let mut pending = vec![command];
        while !pending.is_empty() {
            let mut events = Vec::new();
            for command in pending.drain(..) {
                world::apply(&mut self.world, command, &mut events);
            }
            self.spawning.handle(&events, &mut pending);
            self.window
                .handle(&events, self.config.tile_degrees, &mut self.surface);
            log.extend(events);
        }
        if log.iter().any(Event::is_persistent_change) {
            self.persist();
        }
        log
    }

    fn run(&mut self, command: Command) -> Vec<String> {
        self.pump(command).iter().filter_map(describe).collect()
    }

    fn persist(&mut self) {
        if let Err(error) = save_world(&mut *self.store, &self.world) {
            tracing::warn!(error = %format!("{error:#}"), "failed to save session");
        }
    }

    fn panel(&self) -> Vec<String> {
        query::open_cache(&self.world)
            .and_then(|hash| query::cache_summary(&self.world, hash).ok())
            .map(|summary| {
                CachePanel::from_summary(&summary)
                    .to_string()
                    .lines()
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn status(&self) -> Vec<String> {
        let player = query::player(&self.world);
        let position = player.position();
        let inventory = player.inventory();
        let recent: Vec<String> = inventory
            .iter()
            .rev()
            .take(RECENT_TOKENS)
            .map(ToString::to_string)
            .collect();
        vec![
            format!(
                "Position: {:.6}, {:.6} (cell {})",
                position.lat,
                position.lng,
                query::player_cell(&self.world)
            ),
            format!("Tokens held: {}", inventory.len()),
            format!("Recent tokens: {}", recent.join(" ")),
            format!(
                "Open cache: {}",
                query::open_cache(&self.world)
                    .map_or_else(|| "none".to_owned(), |hash| hash.to_string())
            ),
            format!(
                "Caches drawn: {} of {} known",
                self.surface.drawn_cells().len(),
                query::registry(&self.world).len()
            ),
        ]
    }
}

fn describe(event: &Event) -> Option<String> {
    let line = match event {
        Event::PlayerMoved { to, cell, .. } => {
            format!("You are at {:.6}, {:.6} (cell {cell}).", to.lat, to.lng)
        }
        Event::MovementSuppressed { open } => format!("Close cache {open} before moving."),
        Event::ScanCompleted { spawned, .. } => format!("{spawned} caches nearby."),
        Event::CacheOpened { hash } => format!("Opened cache {hash}."),
        Event::CacheClosed { hash } => format!("Closed cache {hash}."),
        Event::InteractionRejected { hash, reason } => format!("Cannot open {hash}: {reason}."),
        Event::TokenMinted { token, .. } => format!("Minted token {token}."),
        Event::TokenDeposited { token, .. } => format!("Deposited token {token}."),
        Event::TokenWithdrawn { token, .. } => format!("Withdrew token {token}."),
        Event::EconomyRejected { reason, .. } => format!("Refused: {reason}."),
        Event::GameReset { .. } => "Game reset.".to_owned(),
        Event::ScanStarted { .. } | Event::CacheSpawned { .. } => return None,
    };
    Some(line)
}
