//! Whiteboard persistence against the backend data service.

mod record;
mod sync;

pub use record::{WHITEBOARDS_TABLE, WhiteboardRecord, WhiteboardRepository};
pub use sync::{
    LoadOutcome, SaveDecision, SaveOutcome, SaveReceipt, SaveRequest, SaveStart, SaveTracker,
    SyncError,
};
