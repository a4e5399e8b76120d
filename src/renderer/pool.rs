// renderer/pool.rs
use super::batch::Batch;
use std::fmt;

/// Address of a batch inside a [`BatchPool`].
///
/// The generation is bumped every time a slot is handed out again, so an id
/// kept by a former member can never address the recycled instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BatchId {
    index: u32,
    generation: u32,
}

impl BatchId {
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    fn next_generation(self) -> Self {
        Self {
            index: self.index,
            generation: self.generation.wrapping_add(1),
        }
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "batch#{}v{}", self.index, self.generation)
    }
}

/// Receiver of emptied batches.
pub trait BatchReclaim {
    fn reclaim(&mut self, batch: BatchId);
}

/// A plain queue, drained by whoever owns the batches once it is safe to do so.
impl BatchReclaim for Vec<BatchId> {
    fn reclaim(&mut self, batch: BatchId) {
        self.push(batch);
    }
}

impl BatchReclaim for BatchPool {
    fn reclaim(&mut self, batch: BatchId) {
        self.release(batch);
    }
}

/// Owns batch instances and recycles the empty ones.
pub struct BatchPool {
    vertex_limit: usize,
    index_limit: usize,
    batches: Vec<Batch>,
    free: Vec<usize>,
}

impl BatchPool {
    pub fn new(vertex_limit: usize, index_limit: usize) -> Self {
        Self {
            vertex_limit,
            index_limit,
            batches: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Hands out an empty batch, reusing a released one when possible.
    pub fn acquire(&mut self) -> BatchId {
        if let Some(slot) = self.free.pop() {
            let batch = &mut self.batches[slot];
            let id = batch.id().next_generation();
            batch.reassign(id);
            log::trace!("Reusing pooled {}", id);
            return id;
        }

        let id = BatchId::new(self.batches.len() as u32, 0);
        self.batches
            .push(Batch::new(id, self.vertex_limit, self.index_limit));
        log::debug!(
            "Allocated {} ({} vertices / {} indices)",
            id,
            self.vertex_limit,
            self.index_limit
        );
        id
    }

    /// Takes a batch back. Returns false for stale or already released ids.
    pub fn release(&mut self, id: BatchId) -> bool {
        let slot = id.index() as usize;
        let Some(batch) = self.batches.get_mut(slot) else {
            log::warn!("Release of unknown {}", id);
            return false;
        };

        if batch.id() != id || self.free.contains(&slot) {
            log::warn!("Ignoring stale release of {}", id);
            return false;
        }

        if !batch.is_pooled() {
            log::debug!("{} released with {} members", id, batch.member_count());
            batch.reset();
        }

        self.free.push(slot);
        true
    }

    pub fn get(&self, id: BatchId) -> Option<&Batch> {
        self.batches
            .get(id.index() as usize)
            .filter(|batch| batch.id() == id && !batch.is_pooled())
    }

    pub fn get_mut(&mut self, id: BatchId) -> Option<&mut Batch> {
        self.batches
            .get_mut(id.index() as usize)
            .filter(|batch| batch.id() == id && !batch.is_pooled())
    }

    pub fn pooled_count(&self) -> usize {
        self.free.len()
    }

    pub fn active_count(&self) -> usize {
        self.batches.len() - self.free.len()
    }
}
