//! Buffer pool of an embedded relational storage engine: pinned access to
//! fixed-size pages cached over a backing disk file, with LRU eviction and
//! an optional parallel sharding layer.

use thiserror::Error;

mod buffer;
mod clock;
mod disk;
mod lru;
mod page;
mod parallel;
mod replacer;
mod wal;

pub use buffer::BufferPoolManagerInstance;
pub use clock::ClockReplacer;
pub use disk::DiskManager;
pub use lru::LruReplacer;
pub use page::{Page, PageRef};
pub use parallel::ParallelBufferPoolManager;
pub use replacer::Replacer;
pub use wal::WriteAheadLog;

pub const PAGE_SIZE: usize = 4096;

pub type PageID = u32;
pub type FrameID = usize;

/// Reserved sentinel, never assigned to a live page.
pub const INVALID_PAGE_ID: PageID = PageID::MAX;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IOError: {0}")]
    IOError(#[from] std::io::Error),
    #[error("invalid page id")]
    InvalidPageID,
    #[error("page {0} is not resident")]
    PageNotResident(PageID),
    #[error("all frames are pinned")]
    PoolExhausted,
    #[error("page {0} has zero pin count")]
    ZeroPinCount(PageID),
    #[error("page {0} is pinned")]
    PagePinned(PageID),
    #[error("page id space exhausted")]
    PageIDExhausted,
}

#[cfg(test)]
pub(crate) mod test_util {
    use rand::Rng;
    use std::path::PathBuf;

    /// Fresh path for a throwaway db file; callers remove it when done.
    pub fn temp_db_path() -> PathBuf {
        let mut rng = rand::thread_rng();
        std::env::temp_dir().join(format!("rill_{:08x}.db", rng.gen::<u32>()))
    }
}
