//! Authoritative cache state: existence, mint budgets and deposit ledgers.

use std::collections::BTreeMap;

use geocoin_core::{Cell, CellHash, EconomyError, RegistrySnapshot, Token, MAX_MINT_BUDGET};
use geocoin_oracle::{cell_key, cell_key_with, Oracle, INITIAL_VALUE_KEY};

/// Outcome of running the spawn decision for a single cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpawnDecision {
    /// Whether the oracle placed a cache on the cell.
    pub spawned: bool,
    /// Identity of the cell's cache, whether or not it spawned.
    pub hash: CellHash,
    /// Whether this decision registered the cache for the first time.
    pub newly_registered: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct CacheState {
    cell: Cell,
    mint_budget: u32,
    next_serial: u32,
}

/// Registry that owns every cache and deposit ledger of a session.
#[derive(Clone, Debug)]
pub struct CacheRegistry {
    oracle: Oracle,
    spawn_probability: f64,
    caches: BTreeMap<CellHash, CacheState>,
    ledgers: BTreeMap<CellHash, Vec<Token>>,
}

impl CacheRegistry {
    /// Creates an empty registry deciding spawns with `oracle`.
    #[must_use]
    pub fn new(oracle: Oracle, spawn_probability: f64) -> Self {
        Self {
            oracle,
            spawn_probability,
            caches: BTreeMap::new(),
            ledgers: BTreeMap::new(),
        }
    }

    /// Rebuilds a registry from persisted state.
    ///
    /// Caches without a stored budget receive their first-touch budget,
    /// budgets and serials of unknown caches are dropped, and a missing serial
    /// counter resumes after the tokens already minted.
    #[must_use]
    pub fn restore(oracle: Oracle, spawn_probability: f64, snapshot: RegistrySnapshot) -> Self {
        let mut registry = Self::new(oracle, spawn_probability);
        let budgets: BTreeMap<CellHash, u32> = snapshot.mint_budgets.into_iter().collect();
        let serials: BTreeMap<CellHash, u32> = snapshot.mint_serials.into_iter().collect();

        for (hash, cell) in snapshot.caches {
            if hash != cell.cell_hash() {
                tracing::warn!(%hash, %cell, "skipping stored cache whose hash disagrees with its cell");
                continue;
            }
            let initial = registry.initial_budget(cell);
            let mint_budget = match budgets.get(&hash) {
                Some(budget) => (*budget).min(initial),
                None => {
                    tracing::warn!(%hash, "stored cache has no mint budget, using first-touch value");
                    initial
                }
            };
            let next_serial = serials
                .get(&hash)
                .copied()
                .unwrap_or_else(|| initial.saturating_sub(mint_budget));
            let _ = registry.caches.insert(
                hash,
                CacheState {
                    cell,
                    mint_budget,
                    next_serial,
                },
            );
        }

        let orphaned = budgets
            .keys()
            .chain(serials.keys())
            .filter(|hash| !registry.caches.contains_key(hash))
            .count();
        if orphaned > 0 {
            tracing::debug!(orphaned, "dropped counters of unregistered caches");
        }

        for (hash, tokens) in snapshot.deposit_ledgers {
            registry.ledgers.entry(hash).or_default().extend(tokens);
        }

        registry
    }

    /// Oracle used for spawn and budget decisions.
    #[must_use]
    pub const fn oracle(&self) -> Oracle {
        self.oracle
    }

    /// Reports whether the oracle places a cache on `cell`.
    #[must_use]
    pub fn spawns_at(&self, cell: Cell) -> bool {
        self.oracle.luck(&cell_key(cell.i(), cell.j())) < self.spawn_probability
    }

    /// Mint budget a cache on `cell` receives when first registered.
    ///
    /// Always lies within `1..=MAX_MINT_BUDGET`.
    #[must_use]
    pub fn initial_budget(&self, cell: Cell) -> u32 {
        let sample = self
            .oracle
            .luck(&cell_key_with(cell.i(), cell.j(), INITIAL_VALUE_KEY));
        let scaled = (sample * f64::from(MAX_MINT_BUDGET)).floor() as u32;
        scaled.saturating_add(1).min(MAX_MINT_BUDGET)
    }

    /// Runs the spawn decision for `cell`, registering the cache when it spawns.
    pub fn consider_spawn(&mut self, cell: Cell) -> SpawnDecision {
        let hash = cell.cell_hash();
        if !self.spawns_at(cell) {
            return SpawnDecision {
                spawned: false,
                hash,
                newly_registered: false,
            };
        }

        let newly_registered = self.register(cell);
        SpawnDecision {
            spawned: true,
            hash,
            newly_registered,
        }
    }

    /// Registers a cache on `cell` unless one already exists.
    pub fn ensure_exists(&mut self, cell: Cell) -> CellHash {
        let _ = self.register(cell);
        cell.cell_hash()
    }

    fn register(&mut self, cell: Cell) -> bool {
        let hash = cell.cell_hash();
        if self.caches.contains_key(&hash) {
            return false;
        }

        let mint_budget = self.initial_budget(cell);
        let _ = self.caches.insert(
            hash,
            CacheState {
                cell,
                mint_budget,
                next_serial: 0,
            },
        );
        tracing::debug!(%hash, mint_budget, "registered cache");
        true
    }

    /// Reports whether a cache is registered under `hash`.
    #[must_use]
    pub fn contains(&self, hash: CellHash) -> bool {
        self.caches.contains_key(&hash)
    }

    /// Cell of the cache registered under `hash`.
    #[must_use]
    pub fn cell(&self, hash: CellHash) -> Option<Cell> {
        self.caches.get(&hash).map(|state| state.cell)
    }

    /// Number of registered caches.
    #[must_use]
    pub fn len(&self) -> usize {
        self.caches.len()
    }

    /// Reports whether no cache is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.caches.is_empty()
    }

    /// Hashes of all registered caches in ascending order.
    pub fn hashes(&self) -> impl Iterator<Item = CellHash> + '_ {
        self.caches.keys().copied()
    }

    /// Tokens the cache may still mint.
    pub fn mint_budget(&self, hash: CellHash) -> Result<u32, EconomyError> {
        self.caches
            .get(&hash)
            .map(|state| state.mint_budget)
            .ok_or(EconomyError::NotFound)
    }

    /// Creates a token from the cache's budget.
    ///
    /// The budget drops by exactly one on success and is left untouched on
    /// failure.
    pub fn mint(&mut self, hash: CellHash) -> Result<Token, EconomyError> {
        let state = self.caches.get_mut(&hash).ok_or(EconomyError::NotFound)?;
        if state.mint_budget == 0 {
            return Err(EconomyError::InsufficientBudget);
        }

        state.mint_budget -= 1;
        let token = Token::new(state.cell, state.next_serial);
        state.next_serial = state.next_serial.saturating_add(1);
        Ok(token)
    }

    /// Tokens deposited in the cache, oldest first.
    #[must_use]
    pub fn deposit_ledger(&self, hash: CellHash) -> &[Token] {
        self.ledgers.get(&hash).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of tokens held across every ledger.
    #[must_use]
    pub fn deposited_total(&self) -> usize {
        self.ledgers.values().map(Vec::len).sum()
    }

    /// Places `token` on top of the cache's ledger.
    pub fn deposit(&mut self, hash: CellHash, token: Token) {
        self.ledgers.entry(hash).or_default().push(token);
    }

    /// Removes the most recently deposited token.
    pub fn withdraw(&mut self, hash: CellHash) -> Result<Token, EconomyError> {
        self.ledgers
            .get_mut(&hash)
            .and_then(Vec::pop)
            .ok_or(EconomyError::EmptyLedger)
    }

    /// Discards every cache and ledger.
    pub fn reset(&mut self) {
        self.caches.clear();
        self.ledgers.clear();
    }

    /// Captures the registry in its persisted shape.
    #[must_use]
    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            caches: self
                .caches
                .iter()
                .map(|(hash, state)| (*hash, state.cell))
                .collect(),
            mint_budgets: self
                .caches
                .iter()
                .map(|(hash, state)| (*hash, state.mint_budget))
                .collect(),
            mint_serials: self
                .caches
                .iter()
                .map(|(hash, state)| (*hash, state.next_serial))
                .collect(),
            deposit_ledgers: self
                .ledgers
                .iter()
                .map(|(hash, tokens)| (*hash, tokens.clone()))
                .collect(),
        }
    }
}
