// Copyright 2026 the Phloem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! How async compute tasks get executed.

use std::collections::VecDeque;
use std::sync::Mutex;

/// A boxed unit of background work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Executes the background tasks spawned for async nodes.
///
/// The engine hands every async compute to the spawner and never blocks on
/// it; the task reports back through the runtime's completion channel on its
/// own. Hosts pick the execution strategy: [`ThreadSpawner`] for real
/// concurrency, [`ManualSpawner`] for deterministic single-threaded control.
pub trait TaskSpawner {
    /// Runs `task`, now or later, on whatever execution resource this
    /// spawner manages.
    fn spawn(&self, task: Task);
}

/// Spawns one OS thread per task.
///
/// Compute functions are assumed to terminate, so threads are detached; the
/// completion envelope is the only thing that outlives them.
#[derive(Copy, Clone, Debug, Default)]
pub struct ThreadSpawner;

impl TaskSpawner for ThreadSpawner {
    fn spawn(&self, task: Task) {
        let spawned = std::thread::Builder::new()
            .name("phloem-compute".into())
            .spawn(task);
        if let Err(err) = spawned {
            tracing::warn!(?err, "failed to spawn compute thread; task dropped");
        }
    }
}

/// Queues tasks for the caller to run explicitly.
///
/// Nothing executes until [`run_one`](Self::run_one) or
/// [`run_all`](Self::run_all) is called, so tests and single-threaded
/// embedders control exactly when async work completes and in what order
/// (queue order). The queue is behind a mutex only so the spawner can be
/// shared; there is no hidden concurrency.
#[derive(Default)]
pub struct ManualSpawner {
    queue: Mutex<VecDeque<Task>>,
}

impl std::fmt::Debug for ManualSpawner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualSpawner")
            .field("pending", &self.pending())
            .finish()
    }
}

impl ManualSpawner {
    /// Creates an empty spawner.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of queued tasks.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.lock().map_or(0, |queue| queue.len())
    }

    /// Runs the oldest queued task. Returns `false` if the queue was empty.
    pub fn run_one(&self) -> bool {
        let task = self.queue.lock().ok().and_then(|mut queue| queue.pop_front());
        match task {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Runs queued tasks until the queue is empty, including tasks queued by
    /// the tasks themselves. Returns the number run.
    pub fn run_all(&self) -> usize {
        let mut ran = 0;
        while self.run_one() {
            ran += 1;
        }
        ran
    }
}

impl TaskSpawner for ManualSpawner {
    fn spawn(&self, task: Task) {
        if let Ok(mut queue) = self.queue.lock() {
            queue.push_back(task);
        }
    }
}
