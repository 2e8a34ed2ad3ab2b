use crate::disk::DiskManager;
use crate::lru::LruReplacer;
use crate::page::{Page, PageRef};
use crate::replacer::Replacer;
use crate::wal::WriteAheadLog;
use crate::{FrameID, PageID, StorageError, INVALID_PAGE_ID};
use itertools::Itertools;
use log::{error, info};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, RwLock};

/// Everything the instance mutex guards: the resident-page directory, the
/// free frames, and the page-id allocation cursor. A frame is always in
/// exactly one of the free list, the replacer, or the pinned set.
struct PoolInner {
    page_table: HashMap<PageID, FrameID>,
    free_list: VecDeque<FrameID>,
    /// kept wide so the cursor can run past the 32-bit id space and fail
    /// allocation instead of wrapping
    next_page_id: u64,
}

/// One buffer pool shard: a fixed array of frames cached over the disk
/// peer. Page ids allocated by this instance satisfy
/// `id % num_instances == instance_index`.
///
/// Callers read and write page bytes through the returned [`PageRef`]
/// without holding any pool lock, and must drop their frame guard before
/// calling back into the pool with the same page.
pub struct BufferPoolManagerInstance {
    pool_size: usize,
    num_instances: u32,
    instance_index: u32,
    frames: Vec<PageRef>,
    replacer: Box<dyn Replacer>,
    disk: Arc<DiskManager>,
    wal: Option<Arc<dyn WriteAheadLog>>,
    inner: Mutex<PoolInner>,
}

impl BufferPoolManagerInstance {
    pub fn new(pool_size: usize, disk: Arc<DiskManager>) -> Self {
        Self::new_partitioned(pool_size, 1, 0, disk)
    }

    pub fn new_partitioned(
        pool_size: usize,
        num_instances: u32,
        instance_index: u32,
        disk: Arc<DiskManager>,
    ) -> Self {
        let replacer = Box::new(LruReplacer::new(pool_size));
        Self::with_replacer(pool_size, num_instances, instance_index, disk, replacer)
    }

    pub fn with_replacer(
        pool_size: usize,
        num_instances: u32,
        instance_index: u32,
        disk: Arc<DiskManager>,
        replacer: Box<dyn Replacer>,
    ) -> Self {
        assert!(pool_size > 0);
        assert!(num_instances > 0);
        assert!(instance_index < num_instances);
        let frames = (0..pool_size)
            .map(|_| Arc::new(RwLock::new(Page::new())))
            .collect_vec();
        Self {
            pool_size,
            num_instances,
            instance_index,
            frames,
            replacer,
            disk,
            wal: None,
            inner: Mutex::new(PoolInner {
                page_table: HashMap::new(),
                free_list: (0..pool_size).collect(),
                next_page_id: u64::from(instance_index),
            }),
        }
    }

    /// Attach a log peer; it is flushed before every dirty write-back
    /// performed under eviction.
    pub fn with_wal(mut self, wal: Arc<dyn WriteAheadLog>) -> Self {
        self.wal = Some(wal);
        self
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Pop a free frame, or scrub a victim: write it back if dirty, drop
    /// its page-table entry, and reset its metadata and buffer.
    fn take_frame(&self, inner: &mut PoolInner) -> Result<FrameID, StorageError> {
        if let Some(frame_id) = inner.free_list.pop_front() {
            return Ok(frame_id);
        }
        let frame_id = self.replacer.victim().ok_or(StorageError::PoolExhausted)?;
        let mut page = self.frames[frame_id].write().unwrap();
        debug_assert_eq!(page.pin_count, 0);
        if page.is_dirty {
            if let Some(wal) = &self.wal {
                wal.flush(page.page_id);
            }
            if let Err(err) = self.disk.write_page(page.page_id, &page.data[..]) {
                drop(page);
                self.replacer.unpin(frame_id);
                return Err(err);
            }
            info!("write back page {} from frame {}", page.page_id, frame_id);
            page.is_dirty = false;
        }
        inner.page_table.remove(&page.page_id);
        page.reset();
        Ok(frame_id)
    }

    /// Allocate a fresh zeroed page and return it pinned.
    pub fn new_page(&self) -> Result<PageRef, StorageError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.next_page_id >= u64::from(INVALID_PAGE_ID) {
            return Err(StorageError::PageIDExhausted);
        }
        let frame_id = self.take_frame(&mut inner)?;
        let page_id = inner.next_page_id as PageID;
        inner.next_page_id += u64::from(self.num_instances);
        debug_assert_eq!(page_id % self.num_instances, self.instance_index);
        let frame = &self.frames[frame_id];
        {
            let mut page = frame.write().unwrap();
            page.page_id = page_id;
            page.pin_count = 1;
            page.is_dirty = false;
        }
        self.replacer.pin(frame_id);
        inner.page_table.insert(page_id, frame_id);
        info!("new page {} in frame {}", page_id, frame_id);
        Ok(frame.clone())
    }

    /// Return `page_id` pinned, reading it from disk on a miss.
    pub fn fetch_page(&self, page_id: PageID) -> Result<PageRef, StorageError> {
        if page_id == INVALID_PAGE_ID {
            return Err(StorageError::InvalidPageID);
        }
        let mut inner = self.inner.lock().unwrap();
        if let Some(&frame_id) = inner.page_table.get(&page_id) {
            let frame = &self.frames[frame_id];
            frame.write().unwrap().pin_count += 1;
            self.replacer.pin(frame_id);
            return Ok(frame.clone());
        }
        let frame_id = self.take_frame(&mut inner)?;
        let frame = &self.frames[frame_id];
        {
            let mut page = frame.write().unwrap();
            if let Err(err) = self.disk.read_page(page_id, &mut page.data[..]) {
                page.reset();
                drop(page);
                inner.free_list.push_front(frame_id);
                return Err(err);
            }
            page.page_id = page_id;
            page.pin_count = 1;
            page.is_dirty = false;
        }
        self.replacer.pin(frame_id);
        inner.page_table.insert(page_id, frame_id);
        Ok(frame.clone())
    }

    /// Drop one pin. The dirty flag only ever accumulates here; it is
    /// cleared by eviction or an explicit flush.
    pub fn unpin_page(&self, page_id: PageID, is_dirty: bool) -> Result<(), StorageError> {
        let inner = self.inner.lock().unwrap();
        let frame_id = *inner
            .page_table
            .get(&page_id)
            .ok_or(StorageError::PageNotResident(page_id))?;
        let mut page = self.frames[frame_id].write().unwrap();
        if page.pin_count == 0 {
            return Err(StorageError::ZeroPinCount(page_id));
        }
        page.is_dirty |= is_dirty;
        page.pin_count -= 1;
        if page.pin_count == 0 {
            self.replacer.unpin(frame_id);
        }
        Ok(())
    }

    /// Write `page_id` to disk now. The page stays resident and pinned as
    /// it was.
    pub fn flush_page(&self, page_id: PageID) -> Result<(), StorageError> {
        if page_id == INVALID_PAGE_ID {
            return Err(StorageError::InvalidPageID);
        }
        let inner = self.inner.lock().unwrap();
        let frame_id = *inner
            .page_table
            .get(&page_id)
            .ok_or(StorageError::PageNotResident(page_id))?;
        let mut page = self.frames[frame_id].write().unwrap();
        self.disk.write_page(page_id, &page.data[..])?;
        page.is_dirty = false;
        Ok(())
    }

    /// Write every resident page to disk.
    pub fn flush_all_pages(&self) -> Result<(), StorageError> {
        let inner = self.inner.lock().unwrap();
        let resident = inner.page_table.iter().map(|(&p, &f)| (p, f)).collect_vec();
        for (page_id, frame_id) in resident {
            let mut page = self.frames[frame_id].write().unwrap();
            self.disk.write_page(page_id, &page.data[..])?;
            page.is_dirty = false;
        }
        Ok(())
    }

    /// Drop `page_id` from the pool and hand the id back to the disk peer.
    /// Deleting an absent page succeeds; deleting a pinned page fails.
    pub fn delete_page(&self, page_id: PageID) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().unwrap();
        let frame_id = match inner.page_table.get(&page_id) {
            Some(&frame_id) => frame_id,
            None => return Ok(()),
        };
        {
            let mut page = self.frames[frame_id].write().unwrap();
            if page.pin_count > 0 {
                return Err(StorageError::PagePinned(page_id));
            }
            self.disk.deallocate_page(page_id);
            page.reset();
        }
        inner.page_table.remove(&page_id);
        self.replacer.pin(frame_id);
        inner.free_list.push_back(frame_id);
        info!("delete page {} from frame {}", page_id, frame_id);
        Ok(())
    }
}

impl Drop for BufferPoolManagerInstance {
    fn drop(&mut self) {
        let inner = self.inner.lock().unwrap();
        for (&page_id, &frame_id) in inner.page_table.iter() {
            let page = self.frames[frame_id].read().unwrap();
            if page.is_dirty {
                if let Err(err) = self.disk.write_page(page_id, &page.data[..]) {
                    error!("write back page {} on shutdown failed: {}", page_id, err);
                }
            }
        }
    }
}
