//! Pure algorithms and shared types for the duplicate-video detection
//! pipeline: configuration, the frame summarizer, the scene extractor, the
//! window assembler, the ANN abstraction's contract, the duplicate reducer,
//! and whitelist canonicalization. No I/O beyond reading an optional TOML
//! config file; the Store and any real decoder live in sibling crates.

pub mod ann;
pub mod config;
pub mod error;
pub mod frame;
pub mod model;
pub mod reduce;
pub mod scene;
pub mod whitelist;
pub mod window;

pub use config::Config;
pub use error::CoreError;
pub use model::{Cluster, ClusterEntry, FileRecord, Fingerprint};
