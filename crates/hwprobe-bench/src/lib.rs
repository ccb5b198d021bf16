#![deny(clippy::all)]
#![warn(clippy::pedantic)]

//! Benchmark harness for hwprobe.
//!
//! Run benchmarks with: `cargo bench -p hwprobe-bench`
//!
//! The harness's own per-trial work (sample generation, weighing, fingerprinting)
//! should stay small next to the subject process it times. These benchmarks keep
//! an eye on that.
