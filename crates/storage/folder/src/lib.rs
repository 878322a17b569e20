mod storage;

pub use storage::{FolderConfig, FolderStorage};
