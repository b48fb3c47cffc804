//! Local state namespaces backing the pipeline: a plain key-value map and
//! a time-windowed map with bounded retention.

pub mod kv;
pub mod window;

pub use kv::KeyValueStore;
pub use window::WindowStore;
