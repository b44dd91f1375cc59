//! Weight configuration store: persisted, validated, swapped as a whole.

pub mod persist;
pub mod store;

pub use store::WeightStore;
