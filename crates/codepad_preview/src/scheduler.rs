//! Per-target debounce scheduler

use codepad_core::config::PreviewSettings;
use codepad_core::{MarkupAssembler, MarkupSources, RenderableDocument};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Identifies the surface a render is destined for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PreviewTarget(String);

impl PreviewTarget {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PreviewTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PreviewTarget {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// A render that survived its quiet period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewUpdate {
    pub target: PreviewTarget,
    /// Scheduling order across all targets; later edits carry larger values.
    pub generation: u64,
    pub document: RenderableDocument,
}

struct PendingRender {
    generation: u64,
    task: JoinHandle<()>,
}

struct Shared {
    slots: DashMap<PreviewTarget, PendingRender>,
    assembler: MarkupAssembler,
    updates: broadcast::Sender<PreviewUpdate>,
}

/// Debounced preview renderer
///
/// Timers run as tasks on the runtime behind `handle`. Scheduling and
/// cancelling never block on them and may be called from any thread.
pub struct PreviewScheduler {
    shared: Arc<Shared>,
    handle: Handle,
    quiet_period: Duration,
    generation: AtomicU64,
}

impl PreviewScheduler {
    pub fn new(
        handle: Handle,
        quiet_period: Duration,
        assembler: MarkupAssembler,
        capacity: usize,
    ) -> Self {
        let (updates, _) = broadcast::channel(capacity.max(1));
        Self {
            shared: Arc::new(Shared {
                slots: DashMap::new(),
                assembler,
                updates,
            }),
            handle,
            quiet_period,
            generation: AtomicU64::new(0),
        }
    }

    pub fn from_settings(handle: Handle, settings: &PreviewSettings, assembler: MarkupAssembler) -> Self {
        Self::new(
            handle,
            settings.quiet_period(),
            assembler,
            settings.channel_capacity,
        )
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet_period
    }

    /// Receive every update published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<PreviewUpdate> {
        self.shared.updates.subscribe()
    }

    /// Replace `target`'s pending render with one for `sources` and restart
    /// the quiet period. Returns the generation of the new render.
    ///
    /// The slot stays locked while the replacement is installed, so two
    /// concurrent edits to one target always leave exactly one render
    /// pending.
    pub fn schedule(&self, target: PreviewTarget, sources: MarkupSources) -> u64 {
        let slot = self.shared.slots.entry(target.clone());
        // Numbered under the slot lock, so the installed render is always the newest
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;

        match slot {
            Entry::Occupied(mut slot) => {
                let task = self.spawn_render(target.clone(), generation, sources);
                let superseded = slot.insert(PendingRender { generation, task });
                superseded.task.abort();
                tracing::trace!(
                    preview = %target,
                    superseded = superseded.generation,
                    generation,
                    "preview render rescheduled"
                );
            }
            Entry::Vacant(slot) => {
                let task = self.spawn_render(target.clone(), generation, sources);
                slot.insert(PendingRender { generation, task });
                tracing::trace!(preview = %target, generation, "preview render scheduled");
            }
        }

        generation
    }

    /// Drop `target`'s pending render, if any. Returns whether one was pending.
    pub fn cancel_all(&self, target: &PreviewTarget) -> bool {
        match self.shared.slots.remove(target) {
            Some((_, pending)) => {
                pending.task.abort();
                tracing::debug!(preview = %target, generation = pending.generation, "preview render cancelled");
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self, target: &PreviewTarget) -> bool {
        self.shared.slots.contains_key(target)
    }

    pub fn pending_count(&self) -> usize {
        self.shared.slots.len()
    }

    fn spawn_render(
        &self,
        target: PreviewTarget,
        generation: u64,
        sources: MarkupSources,
    ) -> JoinHandle<()> {
        let shared = Arc::clone(&self.shared);
        let deadline = tokio::time::Instant::now() + self.quiet_period;

        self.handle.spawn(async move {
            tokio::time::sleep_until(deadline).await;

            // A newer edit may have replaced this render after the sleep ended
            let claimed = shared
                .slots
                .remove_if(&target, |_, pending| pending.generation == generation);
            if claimed.is_none() {
                return;
            }

            let document = shared.assembler.assemble_sources(&sources);
            tracing::debug!(
                preview = %target,
                generation,
                bytes = document.markup.len(),
                "preview rendered"
            );

            let update = PreviewUpdate {
                target,
                generation,
                document,
            };
            if shared.updates.send(update).is_err() {
                tracing::trace!(generation, "preview rendered with no subscribers");
            }
        })
    }
}

impl Drop for PreviewScheduler {
    fn drop(&mut self) {
        self.shared.slots.retain(|_, pending| {
            pending.task.abort();
            false
        });
    }
}
