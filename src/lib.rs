//! Imsoniack - Per-sample sleep scoring for wearable motion and optical sensors
//!
//! Each incoming sample flows through a deterministic pipeline: validation →
//! motion analysis → signal filtering → heart-rate scoring → score combination
//! → stage classification → record encoding, and is then appended to a record
//! store.
//!
//! ## Modules
//!
//! - **Scoring Pipeline**: Turn one raw sample into an enriched record
//! - **Ingest Server** (`server` feature): Authenticated HTTP endpoint in front of the pipeline
//! - **Upload Client** (`client` feature): Bounded-concurrency uploader for sample batches

pub mod config;
pub mod encoder;
pub mod error;
pub mod filter;
pub mod motion;
pub mod pipeline;
pub mod schema;
pub mod scoring;
pub mod simulate;
pub mod stage;
pub mod store;
pub mod types;

#[cfg(feature = "server")]
pub mod server;

#[cfg(feature = "client")]
pub mod client;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::IngestConfig;
pub use error::IngestError;
pub use pipeline::{assess_sample, enrich, sample_to_record, SleepProcessor};
pub use store::{MemoryStore, NdjsonStore, RecordStore, StoreError};
pub use types::{Accel, EnrichedRecord, SampleAssessment, SensorSample, SleepStage};

/// Library version reported by the health endpoint and the CLI
pub const IMSONIACK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported by the CLI
pub const PRODUCER_NAME: &str = "imsoniack";
