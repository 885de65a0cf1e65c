#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Bounded window over the caches materialised on a rendering surface.
//!
//! Every neighborhood scan produces one batch of rendered caches. The window
//! keeps the most recent [`VISIBILITY_WINDOW_CAPACITY`] committed batches
//! alive and releases older ones from the surface. Releasing a batch only
//! clears its visual representation; the caches themselves live on in the
//! world's registry.

use std::collections::VecDeque;

use geocoin_core::{bounds_of, Bounds, Cell, Event, VISIBILITY_WINDOW_CAPACITY};

/// Rendering collaborator able to draw and erase cache representations.
pub trait Surface {
    /// Handle to a drawn cache.
    type Renderable;

    /// Draws a cache covering `bounds` and returns its handle.
    fn materialize(&mut self, cell: Cell, bounds: Bounds) -> Self::Renderable;

    /// Erases a previously drawn cache.
    fn release(&mut self, renderable: Self::Renderable);
}

/// Identifier assigned to a batch when it begins.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BatchId(u64);

impl BatchId {
    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Renderables produced by a single scan.
#[derive(Debug)]
pub struct Batch<R> {
    id: BatchId,
    renderables: Vec<R>,
}

impl<R> Batch<R> {
    /// Identifier of the batch.
    #[must_use]
    pub const fn id(&self) -> BatchId {
        self.id
    }

    /// Renderables recorded so far, in recording order.
    #[must_use]
    pub fn renderables(&self) -> &[R] {
        &self.renderables
    }

    /// Number of renderables recorded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.renderables.len()
    }

    /// Reports whether nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.renderables.is_empty()
    }

    /// Adds a renderable to the batch.
    pub fn record(&mut self, renderable: R) {
        self.renderables.push(renderable);
    }
}

/// FIFO of committed batches bounded by [`VISIBILITY_WINDOW_CAPACITY`].
#[derive(Debug)]
pub struct VisibilityWindow<R> {
    committed: VecDeque<Batch<R>>,
    pending: Option<Batch<R>>,
    next_id: u64,
}

impl<R> Default for VisibilityWindow<R> {
    fn default() -> Self {
        Self {
            committed: VecDeque::with_capacity(VISIBILITY_WINDOW_CAPACITY + 1),
            pending: None,
            next_id: 0,
        }
    }
}

impl<R> VisibilityWindow<R> {
    /// Creates an empty window.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new, empty batch.
    pub fn begin_batch(&mut self) -> Batch<R> {
        let id = BatchId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        Batch {
            id,
            renderables: Vec::new(),
        }
    }

    /// Records `renderable` into `batch`.
    pub fn record_in_batch(&self, batch: &mut Batch<R>, renderable: R) {
        batch.record(renderable);
    }

    /// Makes `batch` live, releasing the oldest batches beyond capacity.
    ///
    /// Returns the number of renderables released from the surface.
    pub fn commit_batch<S>(&mut self, batch: Batch<R>, surface: &mut S) -> usize
    where
        S: Surface<Renderable = R>,
    {
        self.committed.push_back(batch);
        let mut released = 0;
        while self.committed.len() > VISIBILITY_WINDOW_CAPACITY {
            if let Some(oldest) = self.committed.pop_front() {
                tracing::trace!(batch = oldest.id.get(), "evicting visibility batch");
                released += release_batch(oldest, surface);
            }
        }
        released
    }

    /// Releases every live and pending renderable and empties the window.
    pub fn reset_all<S>(&mut self, surface: &mut S)
    where
        S: Surface<Renderable = R>,
    {
        let mut released = 0;
        for batch in self.committed.drain(..).chain(self.pending.take()) {
            released += release_batch(batch, surface);
        }
        tracing::debug!(released, "visibility window reset");
    }

    /// Committed batches from oldest to newest.
    pub fn live_batches(&self) -> impl Iterator<Item = &Batch<R>> {
        self.committed.iter()
    }

    /// Number of renderables currently materialised by committed batches.
    #[must_use]
    pub fn materialized(&self) -> usize {
        self.committed.iter().map(Batch::len).sum()
    }

    /// Consumes world events, drawing spawned caches batch by batch.
    ///
    /// `ScanStarted` opens a batch, `CacheSpawned` draws into it,
    /// `ScanCompleted` commits it and `GameReset` clears the window.
    pub fn handle<S>(&mut self, events: &[Event], tile_degrees: f64, surface: &mut S)
    where
        S: Surface<Renderable = R>,
    {
        for event in events {
            match event {
                Event::ScanStarted { .. } => {
                    if let Some(stale) = self.pending.take() {
                        let _ = release_batch(stale, surface);
                    }
                    self.pending = Some(self.begin_batch());
                }
                Event::CacheSpawned { cell, .. } => {
                    if let Some(batch) = self.pending.as_mut() {
                        batch.record(surface.materialize(*cell, bounds_of(*cell, tile_degrees)));
                    }
                }
                Event::ScanCompleted { .. } => {
                    if let Some(batch) = self.pending.take() {
                        let _ = self.commit_batch(batch, surface);
                    }
                }
                Event::GameReset { .. } => self.reset_all(surface),
                _ => {}
            }
        }
    }
}

fn release_batch<R, S>(batch: Batch<R>, surface: &mut S) -> usize
where
    S: Surface<Renderable = R>,
{
    let count = batch.renderables.len();
    for renderable in batch.renderables {
        surface.release(renderable);
    }
    count
}
