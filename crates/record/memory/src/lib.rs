mod store;

pub use store::MemoryMediaStore;
