use crate::FrameID;

/// Eviction policy over the unpinned, resident frames of one pool instance.
///
/// All operations are total: `pin` on an untracked frame and `unpin` on an
/// already-tracked frame are no-ops, and `victim` on an empty replacer
/// returns `None`. Implementations serialize internally; the pool calls in
/// with its instance mutex held, never the other way around.
pub trait Replacer: Send + Sync {
    /// Remove and return the next eviction candidate, if any.
    fn victim(&self) -> Option<FrameID>;

    /// Make `frame_id` ineligible for eviction.
    fn pin(&self, frame_id: FrameID);

    /// Make `frame_id` eligible for eviction.
    fn unpin(&self, frame_id: FrameID);

    /// Number of frames currently eligible for eviction.
    fn size(&self) -> usize;
}
