#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::return_self_not_must_use)]

//! Measurement core for hwprobe.
//!
//! Times an external hashing executable on random inputs and pairs each
//! duration with the Hamming weight of the input. Logging is left to the CLI.

pub mod config;
pub mod error;
pub mod export;
pub mod harness;
pub mod plot;
pub mod version;

pub use config::HarnessConfig;
pub use error::Error;
pub use export::{export, read_json, write_csv, write_json, ExportFormat};
pub use harness::{ResultSet, SampleCollector, TrialRecord};
pub use plot::{ScatterPlot, Visualizer};
pub use version::VERSION;
