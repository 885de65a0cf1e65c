#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic spawning system responsible for scheduling neighborhood scans.

use geocoin_core::{Cell, Command, Event};

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    radius: u32,
}

impl Config {
    /// Creates a new configuration scanning `radius` tiles around the player.
    #[must_use]
    pub const fn new(radius: u32) -> Self {
        Self { radius }
    }

    /// Half-width of the scanned window in tiles.
    #[must_use]
    pub const fn radius(&self) -> u32 {
        self.radius
    }
}

/// Pure system that asks the world to scan around the player after every move.
#[derive(Debug)]
pub struct Spawning {
    radius: u32,
    last_center: Option<Cell>,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            radius: config.radius,
            last_center: None,
        }
    }

    /// Emits the scan that populates the map when a session starts.
    pub fn initial_scan(&mut self, player_cell: Cell, out: &mut Vec<Command>) {
        self.request_scan(player_cell, out);
    }

    /// Consumes world events and emits one scan per move or reset.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::PlayerMoved { cell, .. } => self.request_scan(*cell, out),
                Event::GameReset { player_cell } => self.request_scan(*player_cell, out),
                _ => {}
            }
        }
    }

    /// Centre of the most recently requested scan.
    #[must_use]
    pub const fn last_center(&self) -> Option<Cell> {
        self.last_center
    }

    fn request_scan(&mut self, center: Cell, out: &mut Vec<Command>) {
        self.last_center = Some(center);
        out.push(Command::ScanNeighborhood {
            center,
            radius: self.radius,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geocoin_core::Position;

    #[test]
    fn ignores_events_without_movement() {
        let mut spawning = Spawning::new(Config::new(8));
        let mut commands = Vec::new();
        spawning.handle(
            &[Event::ScanStarted {
                center: Cell::new(0, 0),
            }],
            &mut commands,
        );
        assert!(commands.is_empty());
        assert_eq!(spawning.last_center(), None);
    }

    #[test]
    fn scans_once_per_move() {
        let mut spawning = Spawning::new(Config::new(3));
        let mut commands = Vec::new();
        let origin = Position::new(0.0, 0.0);
        spawning.handle(
            &[
                Event::PlayerMoved {
                    from: origin,
                    to: origin,
                    cell: Cell::new(1, 0),
                },
                Event::PlayerMoved {
                    from: origin,
                    to: origin,
                    cell: Cell::new(2, 0),
                },
            ],
            &mut commands,
        );
        assert_eq!(
            commands,
            vec![
                Command::ScanNeighborhood {
                    center: Cell::new(1, 0),
                    radius: 3,
                },
                Command::ScanNeighborhood {
                    center: Cell::new(2, 0),
                    radius: 3,
                },
            ]
        );
        assert_eq!(spawning.last_center(), Some(Cell::new(2, 0)));
    }
}
