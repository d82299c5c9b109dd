pub mod atomic_write;

pub use atomic_write::{AtomicFile, Options as AtomicWriteOptions, atomic_read, atomic_write, staging_path};
