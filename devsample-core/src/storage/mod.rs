pub mod interner;
pub mod model;

pub use interner::StringInterner;
pub use model::Snapshot;
