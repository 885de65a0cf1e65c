//! Player inventory and movement history.

use geocoin_core::{PlayerLocation, PlayerSnapshot, Position, Token};

/// The single player of a session.
#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    inventory: Vec<Token>,
    location: PlayerLocation,
    trail: Vec<Position>,
}

impl Player {
    /// Creates a player with an empty inventory standing at `spawn`.
    #[must_use]
    pub fn new(spawn: Position) -> Self {
        Self::from_snapshot(PlayerSnapshot::at(spawn))
    }

    /// Rebuilds a player from persisted state.
    #[must_use]
    pub fn from_snapshot(snapshot: PlayerSnapshot) -> Self {
        Self {
            inventory: snapshot.inventory,
            location: snapshot.location,
            trail: snapshot.trail,
        }
    }

    /// Captures the player in its persisted shape.
    #[must_use]
    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            inventory: self.inventory.clone(),
            location: self.location,
            trail: self.trail.clone(),
        }
    }

    /// Held tokens, oldest first.
    #[must_use]
    pub fn inventory(&self) -> &[Token] {
        &self.inventory
    }

    /// Current and previous positions.
    #[must_use]
    pub const fn location(&self) -> PlayerLocation {
        self.location
    }

    /// Where the player stands now.
    #[must_use]
    pub const fn position(&self) -> Position {
        self.location.current
    }

    /// Positions visited, oldest first.
    #[must_use]
    pub fn trail(&self) -> &[Position] {
        &self.trail
    }

    /// Adds `token` on top of the inventory.
    pub fn push_token(&mut self, token: Token) {
        self.inventory.push(token);
    }

    /// Removes the most recently acquired token.
    pub fn pop_token(&mut self) -> Option<Token> {
        self.inventory.pop()
    }

    /// Moves the player to `position`, returning where they stood before.
    pub fn move_to(&mut self, position: Position) -> Position {
        let from = self.location.current;
        self.location = PlayerLocation {
            current: position,
            previous: from,
        };
        self.trail.push(position);
        from
    }

    /// Drops every held token and restarts the trail at the current position.
    pub fn reset(&mut self) {
        self.inventory.clear();
        self.trail.clear();
        self.trail.push(self.location.current);
    }
}
