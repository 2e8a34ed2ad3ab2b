use crate::{PageID, INVALID_PAGE_ID, PAGE_SIZE};
use std::sync::{Arc, RwLock};

/// Contents of one frame: a fixed-size byte buffer plus the metadata the
/// pool keeps per frame. A frame with `page_id == INVALID_PAGE_ID` holds no
/// page; its pin count is zero and its buffer is zeroed.
pub struct Page {
    pub page_id: PageID,
    pub pin_count: u32,
    pub is_dirty: bool,
    pub data: Box<[u8; PAGE_SIZE]>,
}

/// Shared handle to a frame. Holding one of these with a non-zero pin count
/// keeps the frame from being reused; lock it to read or write the bytes.
pub type PageRef = Arc<RwLock<Page>>;

impl Page {
    pub fn new() -> Self {
        Self {
            page_id: INVALID_PAGE_ID,
            pin_count: 0,
            is_dirty: false,
            data: Box::new([0; PAGE_SIZE]),
        }
    }

    /// Back to the free-frame state: no page, no pins, zeroed buffer.
    pub fn reset(&mut self) {
        self.page_id = INVALID_PAGE_ID;
        self.pin_count = 0;
        self.is_dirty = false;
        self.data.fill(0);
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}
