//! Hamming-weight timing harness.
//!
//! A run is a sequence of trials. Each trial generates a random sample,
//! computes its Hamming weight, invokes the subject on it as a child process
//! and records the pair (weight, wall-clock duration).
//!
//! ## Design Principles
//! - Strictly sequential: one child process at a time
//! - All-or-nothing: the first failing trial aborts the run
//! - Progress and plotting sit behind traits so the core has no console or
//!   chart dependency of its own

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod collector;
pub mod corpus;
pub mod report;
pub mod sink;
pub mod stats;
pub mod subject;
pub mod weight;

pub use collector::SampleCollector;
pub use corpus::{CorpusGenerator, Sample, ALPHABET};
pub use report::{MachineInfo, RunParams, RunReport, SubjectInfo, REPORT_SCHEMA_VERSION};
pub use sink::{NoProgress, ProgressSink};
pub use stats::{compute_stats, pearson, summarize, DurationStats, RunSummary};
pub use subject::{
    ensure_built, invoke, BuildCommand, BuildOutcome, BuiltSubject, Invocation, ProcessSubject,
    Subject, SUBJECT_FLAG,
};
pub use weight::weight;

/// One trial's measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialRecord {
    pub weight: u64,
    pub duration: Duration,
}

/// All measurements of a run, as parallel sequences in trial order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    weights: Vec<u64>,
    /// Serialized as fractional seconds.
    #[serde(with = "duration_secs")]
    durations: Vec<Duration>,
}

impl ResultSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(trials: usize) -> Self {
        Self {
            weights: Vec::with_capacity(trials),
            durations: Vec::with_capacity(trials),
        }
    }

    /// Build from parallel sequences. Fails if their lengths differ.
    pub fn from_parts(weights: Vec<u64>, durations: Vec<Duration>) -> Result<Self, crate::Error> {
        if weights.len() != durations.len() {
            return Err(crate::Error::invalid_argument(format!(
                "{} weights but {} durations",
                weights.len(),
                durations.len()
            )));
        }
        Ok(Self { weights, durations })
    }

    pub fn push(&mut self, record: TrialRecord) {
        self.weights.push(record.weight);
        self.durations.push(record.duration);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    #[must_use]
    pub fn weights(&self) -> &[u64] {
        &self.weights
    }

    #[must_use]
    pub fn durations(&self) -> &[Duration] {
        &self.durations
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<TrialRecord> {
        Some(TrialRecord {
            weight: *self.weights.get(index)?,
            duration: *self.durations.get(index)?,
        })
    }

    /// Records in trial order.
    pub fn records(&self) -> impl Iterator<Item = TrialRecord> + '_ {
        self.weights
            .iter()
            .zip(&self.durations)
            .map(|(&weight, &duration)| TrialRecord { weight, duration })
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(durations: &[Duration], s: S) -> Result<S::Ok, S::Error> {
        s.collect_seq(durations.iter().map(Duration::as_secs_f64))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Duration>, D::Error> {
        Vec::<f64>::deserialize(d)?
            .into_iter()
            .map(|secs| Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom))
            .collect()
    }
}
