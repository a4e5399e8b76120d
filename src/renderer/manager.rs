// renderer/manager.rs
use super::batch::{BatchState, MergedDraw};
use super::pool::{BatchId, BatchPool};
use crate::scene::Scene;
use crate::settings::BatchSettings;
use hecs::Entity;

/// One submission produced from the active batches.
#[derive(Debug, Clone, Copy)]
pub enum DrawItem<'a> {
    /// Combined geometry of a batch, drawn in one call.
    Merged(MergedDraw<'a>),
    /// A pass-through member, drawn with its own mesh and transform.
    Single { entity: Entity, batch: BatchId },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub active_batches: usize,
    pub pooled_batches: usize,
    pub merged_members: usize,
    pub pass_through_members: usize,
    pub vertices: usize,
    pub indices: usize,
}

/// Routes entities into batches and drives their per-frame refresh.
pub struct BatchManager {
    settings: BatchSettings,
    pool: BatchPool,
    active: Vec<BatchId>,
    open: Option<BatchId>,
    reclaimed: Vec<BatchId>,
}

impl BatchManager {
    pub fn new(settings: BatchSettings) -> Self {
        let settings = settings.validate();
        let pool = BatchPool::new(settings.vertex_limit, settings.index_limit);
        Self {
            settings,
            pool,
            active: Vec::new(),
            open: None,
            reclaimed: Vec::new(),
        }
    }

    pub fn settings(&self) -> &BatchSettings {
        &self.settings
    }

    /// Places `entity` in a batch and returns which one.
    ///
    /// Entities already held by a live batch are forwarded to it, which only
    /// refreshes their transform slot.
    pub fn add(&mut self, scene: &mut Scene, entity: Entity) -> Option<BatchId> {
        if let Some(current) = scene.batch_of(entity) {
            if let Some(batch) = self.pool.get_mut(current) {
                if batch.contains(entity) && batch.add(scene, entity) {
                    return Some(current);
                }
            }
        }

        if let Some(open) = self.open {
            if let Some(batch) = self.pool.get_mut(open) {
                if batch.add(scene, entity) {
                    return Some(open);
                }
            }
        }

        let id = self.pool.acquire();
        let accepted = self
            .pool
            .get_mut(id)
            .is_some_and(|batch| batch.add(scene, entity));

        if !accepted {
            log::warn!("No batch accepted {:?}, leaving it out", entity);
            self.pool.release(id);
            return None;
        }

        log::debug!("Opened {} for {:?}", id, entity);
        self.active.push(id);
        self.open = Some(id);
        Some(id)
    }

    /// Adds every entity that carries render data and is not held by a live batch.
    ///
    /// An assignment naming a released or recycled batch counts as unbatched.
    pub fn add_all(&mut self, scene: &mut Scene) -> usize {
        let pending: Vec<Entity> = scene
            .world
            .query::<&super::RenderData>()
            .iter()
            .filter(|(entity, render_data)| {
                render_data.enabled && !self.is_held(*entity, render_data.batch())
            })
            .map(|(entity, _)| entity)
            .collect();

        let mut added = 0;
        for entity in pending {
            if scene.is_renderable(entity) && self.add(scene, entity).is_some() {
                added += 1;
            }
        }
        added
    }

    fn is_held(&self, entity: Entity, assignment: Option<BatchId>) -> bool {
        assignment
            .and_then(|id| self.pool.get(id))
            .is_some_and(|batch| batch.contains(entity))
    }

    /// Runs the per-frame refresh on every active batch and returns how many are ready.
    ///
    /// Emptied batches are handed back to the pool once all batches are done.
    pub fn prepare(&mut self, scene: &Scene) -> usize {
        let mut ready = 0;
        for &id in &self.active {
            let Some(batch) = self.pool.get_mut(id) else {
                continue;
            };
            if batch.prepare_for_draw(scene, &mut self.reclaimed) == BatchState::Ready {
                ready += 1;
            }
        }

        for id in self.reclaimed.drain(..) {
            self.pool.release(id);
            self.active.retain(|&active| active != id);
            if self.open == Some(id) {
                self.open = None;
            }
        }

        log::trace!(
            "{} of {} batches ready, {} pooled",
            ready,
            self.active.len(),
            self.pool.pooled_count()
        );
        ready
    }

    pub fn mark_all_dirty(&mut self) {
        for &id in &self.active {
            if let Some(batch) = self.pool.get_mut(id) {
                batch.mark_dirty();
            }
        }
    }

    pub fn refresh_transforms(&mut self, scene: &Scene) {
        for &id in &self.active {
            if let Some(batch) = self.pool.get_mut(id) {
                batch.refresh_transforms(scene);
            }
        }
    }

    pub fn batch(&self, id: BatchId) -> Option<&super::Batch> {
        self.pool.get(id)
    }

    pub fn active_batches(&self) -> impl Iterator<Item = &super::Batch> + '_ {
        self.active.iter().filter_map(|&id| self.pool.get(id))
    }

    /// Submissions for this frame, in batch creation order.
    pub fn draw_list(&self) -> Vec<DrawItem<'_>> {
        let mut items = Vec::new();
        for batch in self.active_batches() {
            if let Some(merged) = batch.merged_draw() {
                items.push(DrawItem::Merged(merged));
            }
            items.extend(batch.pass_through_members().map(|entity| DrawItem::Single {
                entity,
                batch: batch.id(),
            }));
        }
        items
    }

    pub fn stats(&self) -> BatchStats {
        self.active_batches().fold(
            BatchStats {
                pooled_batches: self.pool.pooled_count(),
                ..BatchStats::default()
            },
            |mut stats, batch| {
                stats.active_batches += 1;
                stats.merged_members += batch.merged_members().count();
                stats.pass_through_members += batch.pass_through_members().count();
                stats.vertices += batch.vertex_count();
                stats.indices += batch.index_count();
                stats
            },
        )
    }
}

impl Default for BatchManager {
    fn default() -> Self {
        Self::new(BatchSettings::default())
    }
}
