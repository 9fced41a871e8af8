pub mod dataset;
pub mod encoder;
pub mod loader;

pub use dataset::InteractionDataset;
pub use encoder::{EntityKind, IdEncoder};
