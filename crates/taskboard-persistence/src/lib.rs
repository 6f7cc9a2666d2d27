pub mod dataset;
pub mod metadata;
pub mod store;

pub use dataset::Dataset;
pub use metadata::{PersistenceMetadata, FORMAT_VERSION};
pub use store::*;
