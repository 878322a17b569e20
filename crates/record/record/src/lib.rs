pub mod error;
pub mod record;
pub mod store;
pub mod testing;

pub use error::RecordError;
pub use record::{MediaId, MediaRecord, infer_extension};
pub use store::MediaRecordStore;
