//! Inventory data: listing records, export files and sync diffing

mod record;
pub mod loader;
pub mod sync;

pub use loader::{load_records, save_records};
pub use record::ListingRecord;
pub use sync::{apply_sync, apply_sync_at, plan_sync, SyncPlan, STATUS_ACTIVE, STATUS_REMOVED};
