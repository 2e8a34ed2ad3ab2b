use crate::buffer::BufferPoolManagerInstance;
use crate::disk::DiskManager;
use crate::page::PageRef;
use crate::{PageID, StorageError};
use itertools::Itertools;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Partitions the page-id space across `num_instances` pool shards over one
/// shared disk peer. Page `p` belongs to shard `p % num_instances`, and each
/// shard only ever allocates ids belonging to it, so ids never collide.
pub struct ParallelBufferPoolManager {
    instances: Vec<Arc<BufferPoolManagerInstance>>,
    next_instance: AtomicUsize,
}

impl ParallelBufferPoolManager {
    /// `pool_size` is the frame count per shard.
    pub fn new(num_instances: u32, pool_size: usize, disk: Arc<DiskManager>) -> Self {
        assert!(num_instances > 0);
        let instances = (0..num_instances)
            .map(|index| {
                Arc::new(BufferPoolManagerInstance::new_partitioned(
                    pool_size,
                    num_instances,
                    index,
                    disk.clone(),
                ))
            })
            .collect_vec();
        Self {
            instances,
            next_instance: AtomicUsize::new(0),
        }
    }

    pub fn num_instances(&self) -> usize {
        self.instances.len()
    }

    /// Total frames across all shards.
    pub fn pool_size(&self) -> usize {
        self.instances.iter().map(|i| i.pool_size()).sum()
    }

    fn shard(&self, page_id: PageID) -> &BufferPoolManagerInstance {
        &self.instances[page_id as usize % self.instances.len()]
    }

    /// Try each shard once for a free or evictable frame, starting one past
    /// where the previous call started, and return the first success.
    pub fn new_page(&self) -> Result<PageRef, StorageError> {
        let start = self.next_instance.fetch_add(1, Ordering::Relaxed);
        for offset in 0..self.instances.len() {
            let instance = &self.instances[(start + offset) % self.instances.len()];
            match instance.new_page() {
                Err(StorageError::PoolExhausted) => continue,
                result => return result,
            }
        }
        Err(StorageError::PoolExhausted)
    }

    pub fn fetch_page(&self, page_id: PageID) -> Result<PageRef, StorageError> {
        self.shard(page_id).fetch_page(page_id)
    }

    pub fn unpin_page(&self, page_id: PageID, is_dirty: bool) -> Result<(), StorageError> {
        self.shard(page_id).unpin_page(page_id, is_dirty)
    }

    pub fn flush_page(&self, page_id: PageID) -> Result<(), StorageError> {
        self.shard(page_id).flush_page(page_id)
    }

    pub fn delete_page(&self, page_id: PageID) -> Result<(), StorageError> {
        self.shard(page_id).delete_page(page_id)
    }

    pub fn flush_all_pages(&self) -> Result<(), StorageError> {
        for instance in &self.instances {
            instance.flush_all_pages()?;
        }
        Ok(())
    }
}
