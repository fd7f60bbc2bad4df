//! # Topology Cache
//!
//! Holds at most one snapshot with its build time.
//!
//! Readers go through an `RwLock` and never see a half-built snapshot: the
//! entry is swapped in whole. Rebuilds are serialized by an async gate, and a
//! caller that queued behind a rebuild receives that rebuild's outcome, success
//! or failure, instead of starting another one.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use topomap_common::topology::TopologySnapshot;
use tracing::debug;

type Outcome<E> = Result<Arc<TopologySnapshot>, E>;

struct Entry {
    snapshot: Arc<TopologySnapshot>,
    built_at: Instant,
}

struct State<E> {
    entry: Option<Entry>,
    /// Builds that ran to completion, successful or not. Lets a queued caller
    /// notice that the build it waited on has finished.
    finished_builds: u64,
    /// Outcome of the latest finished build. Failures live only here, never in `entry`.
    last_outcome: Option<Outcome<E>>,
    /// Bumped by `invalidate`, so a build that started earlier is not stored.
    generation: u64,
}

pub struct TopologyCache<E> {
    state: RwLock<State<E>>,
    build_gate: Mutex<()>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<E> Default for TopologyCache<E> {
    fn default() -> Self {
        Self {
            state: RwLock::new(State {
                entry: None,
                finished_builds: 0,
                last_outcome: None,
                generation: 0,
            }),
            build_gate: Mutex::new(()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }
}

impl<E: Clone> TopologyCache<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached snapshot while it is younger than `ttl`, otherwise
    /// runs `build` once on behalf of every concurrent caller.
    ///
    /// A failed build leaves the previous entry untouched. Its error goes to
    /// the callers that were waiting on it; the next caller builds again.
    pub async fn get_or_build<F, Fut>(&self, ttl: Duration, build: F) -> Outcome<E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<TopologySnapshot, E>>,
    {
        if let Some(snapshot) = self.peek(ttl) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(snapshot);
        }

        let seen = self.read().finished_builds;
        let _gate = self.build_gate.lock().await;

        {
            let state = self.read();
            if state.finished_builds != seen {
                if let Some(outcome) = &state.last_outcome {
                    debug!("Sharing the outcome of the rebuild this caller waited on");
                    if outcome.is_ok() {
                        self.hits.fetch_add(1, Ordering::Relaxed);
                    }
                    return outcome.clone();
                }
            }
            if let Some(entry) = state.entry.as_ref().filter(|e| e.built_at.elapsed() < ttl) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(Arc::clone(&entry.snapshot));
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let generation = self.read().generation;
        let outcome = build().await.map(Arc::new);

        let mut state = self.write();
        state.finished_builds += 1;
        if state.generation != generation {
            debug!("Cache invalidated during rebuild, result not stored");
            state.last_outcome = None;
            return outcome;
        }
        match &outcome {
            Ok(snapshot) => {
                state.entry = Some(Entry {
                    snapshot: Arc::clone(snapshot),
                    built_at: Instant::now(),
                });
            }
            Err(_) => debug!("Rebuild failed, previous entry kept"),
        }
        state.last_outcome = Some(outcome.clone());
        outcome
    }

    /// The current snapshot if it is younger than `ttl`. Never builds.
    pub fn peek(&self, ttl: Duration) -> Option<Arc<TopologySnapshot>> {
        self.read()
            .entry
            .as_ref()
            .filter(|entry| entry.built_at.elapsed() < ttl)
            .map(|entry| Arc::clone(&entry.snapshot))
    }

    pub fn invalidate(&self) {
        let mut state = self.write();
        state.entry = None;
        state.last_outcome = None;
        state.generation += 1;
        debug!("Topology cache invalidated");
    }

    /// Fraction of lookups answered without a build, 0 before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        match hits + misses {
            0 => 0.0,
            total => hits as f64 / total as f64,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, State<E>> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, State<E>> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
