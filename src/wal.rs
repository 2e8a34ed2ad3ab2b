use crate::PageID;

/// Log peer consulted before a dirty page is written back during eviction.
///
/// `flush` drains every log record for `page_id` up to the current LSN
/// before returning. The pool calls it with its instance mutex held, so
/// implementations must not call back into the pool.
pub trait WriteAheadLog: Send + Sync {
    fn flush(&self, page_id: PageID);
}
