//! Holds registered macros and moves them to and from the on-disk store.
pub mod persist;
pub mod registry;

pub use persist::StoreDocument;
pub use registry::Registry;
