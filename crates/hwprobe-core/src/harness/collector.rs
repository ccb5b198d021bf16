//! The trial loop.

use super::corpus::CorpusGenerator;
use super::sink::ProgressSink;
use super::subject::{BuildOutcome, Subject};
use super::weight::{ascii_weight_bound, weight};
use super::{ResultSet, TrialRecord};
use crate::error::Error;
use rand::Rng;

/// Runs trials against a subject and accumulates a [`ResultSet`].
pub struct SampleCollector<R, S, P> {
    generator: CorpusGenerator<R>,
    subject: S,
    progress: P,
    progress_interval: u64,
    build_outcome: Option<BuildOutcome>,
}

impl<R: Rng, S: Subject, P: ProgressSink> SampleCollector<R, S, P> {
    /// `progress_interval` of zero is treated as one.
    pub fn new(
        generator: CorpusGenerator<R>,
        subject: S,
        progress: P,
        progress_interval: u64,
    ) -> Self {
        Self {
            generator,
            subject,
            progress,
            progress_interval: progress_interval.max(1),
            build_outcome: None,
        }
    }

    /// Run `trial_count` trials on samples of `sample_length` characters.
    ///
    /// Builds the subject first if needed. The first failure aborts the run;
    /// invocation failures carry the zero-based index of the failing trial.
    pub fn run(&mut self, trial_count: u64, sample_length: usize) -> Result<ResultSet, Error> {
        if trial_count == 0 {
            return Err(Error::invalid_argument("trial count must be positive"));
        }
        if sample_length == 0 {
            return Err(Error::invalid_argument("sample length must be positive"));
        }

        self.build_outcome = Some(self.subject.ensure_built(&mut self.progress)?);

        let capacity = usize::try_from(trial_count).unwrap_or(usize::MAX).min(1 << 24);
        let mut results = ResultSet::with_capacity(capacity);

        for trial in 0..trial_count {
            if trial % self.progress_interval == 0 {
                self.progress.iteration(trial, trial_count);
            }

            let sample = self.generator.generate(sample_length)?;
            let sample_weight = weight(sample.as_str());
            debug_assert!(sample_weight <= ascii_weight_bound(sample_length));

            let invocation = self
                .subject
                .invoke(&sample)
                .map_err(|e| e.at_trial(trial))?;

            results.push(TrialRecord {
                weight: sample_weight,
                duration: invocation.elapsed,
            });
        }

        self.progress.finished(trial_count);
        Ok(results)
    }

    /// What the build check did on the last `run`, if one happened.
    #[must_use]
    pub fn build_outcome(&self) -> Option<BuildOutcome> {
        self.build_outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::corpus::Sample;
    use crate::harness::subject::Invocation;
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    /// Scripted subject that remembers every sample it was given.
    struct ScriptedSubject {
        durations: Vec<f64>,
        fail_on_call: Option<usize>,
        seen: Vec<Sample>,
        builds: usize,
    }

    impl ScriptedSubject {
        fn new(durations: &[f64]) -> Self {
            Self {
                durations: durations.to_vec(),
                fail_on_call: None,
                seen: Vec::new(),
                builds: 0,
            }
        }

        fn failing_on(mut self, call: usize) -> Self {
            self.fail_on_call = Some(call);
            self
        }
    }

    impl Subject for ScriptedSubject {
        fn ensure_built(&mut self, _progress: &mut dyn ProgressSink) -> Result<BuildOutcome, Error> {
            self.builds += 1;
            Ok(BuildOutcome::AlreadyPresent)
        }

        fn invoke(&mut self, sample: &Sample) -> Result<Invocation, Error> {
            let call = self.seen.len();
            self.seen.push(sample.clone());
            if self.fail_on_call == Some(call) {
                return Err(Error::SubjectInvocation {
                    path: PathBuf::from("scripted"),
                    trial: None,
                    reason: "exited with status 1".into(),
                });
            }
            Ok(Invocation {
                output: b"ok".to_vec(),
                elapsed: Duration::from_secs_f64(self.durations[call % self.durations.len()]),
            })
        }
    }

    #[derive(Default)]
    struct RecordingProgress {
        iterations: Vec<u64>,
        builds: Vec<PathBuf>,
        finished: Option<u64>,
    }

    impl ProgressSink for RecordingProgress {
        fn build_started(&mut self, dir: &Path) {
            self.builds.push(dir.to_path_buf());
        }

        fn iteration(&mut self, index: u64, _total: u64) {
            self.iterations.push(index);
        }

        fn finished(&mut self, total: u64) {
            self.finished = Some(total);
        }
    }

    #[test]
    fn test_run_collects_one_record_per_trial() {
        let mut subject = ScriptedSubject::new(&[0.01, 0.02, 0.03]);
        let mut collector = SampleCollector::new(
            CorpusGenerator::from_seed(Some(42)),
            &mut subject,
            RecordingProgress::default(),
            100,
        );

        let results = collector.run(3, 4).unwrap();
        assert_eq!(collector.build_outcome(), Some(BuildOutcome::AlreadyPresent));
        drop(collector);

        assert_eq!(results.len(), 3);
        assert_eq!(subject.builds, 1);
        assert_eq!(subject.seen.len(), 3);
        for (record, sample) in results.records().zip(&subject.seen) {
            assert_eq!(sample.len(), 4);
            let expected: u64 = sample
                .as_str()
                .bytes()
                .map(|b| u64::from(b.count_ones()))
                .sum();
            assert_eq!(record.weight, expected);
        }
        assert_eq!(
            results.durations(),
            &[
                Duration::from_secs_f64(0.01),
                Duration::from_secs_f64(0.02),
                Duration::from_secs_f64(0.03),
            ]
        );
    }

    #[test]
    fn test_failure_aborts_remaining_trials() {
        let mut subject = ScriptedSubject::new(&[0.01, 0.02, 0.03]).failing_on(1);
        let mut collector = SampleCollector::new(
            CorpusGenerator::from_seed(Some(42)),
            &mut subject,
            RecordingProgress::default(),
            100,
        );

        let err = collector.run(3, 4).unwrap_err();
        drop(collector);

        match err {
            Error::SubjectInvocation { trial, .. } => assert_eq!(trial, Some(1)),
            other => panic!("expected SubjectInvocation, got {other:?}"),
        }
        // The third trial never reached the subject.
        assert_eq!(subject.seen.len(), 2);
    }

    #[test]
    fn test_progress_every_interval() {
        let mut progress = RecordingProgress::default();
        let mut collector = SampleCollector::new(
            CorpusGenerator::from_seed(Some(3)),
            ScriptedSubject::new(&[0.001]),
            &mut progress,
            100,
        );

        let results = collector.run(250, 8).unwrap();
        drop(collector);

        assert_eq!(results.len(), 250);
        assert_eq!(progress.iterations, vec![0, 100, 200]);
        assert_eq!(progress.finished, Some(250));
        assert!(progress.builds.is_empty());
    }

    #[test]
    fn test_no_finished_signal_on_failure() {
        let mut progress = RecordingProgress::default();
        let mut collector = SampleCollector::new(
            CorpusGenerator::from_seed(Some(3)),
            ScriptedSubject::new(&[0.001]).failing_on(0),
            &mut progress,
            1,
        );

        assert!(collector.run(5, 8).is_err());
        drop(collector);
        assert_eq!(progress.iterations, vec![0]);
        assert_eq!(progress.finished, None);
    }

    #[test]
    fn test_zero_sizes_are_invalid() {
        let mut collector = SampleCollector::new(
            CorpusGenerator::from_seed(Some(3)),
            ScriptedSubject::new(&[0.001]),
            RecordingProgress::default(),
            100,
        );

        assert!(matches!(collector.run(0, 8), Err(Error::InvalidArgument(_))));
        assert!(matches!(collector.run(3, 0), Err(Error::InvalidArgument(_))));
        assert_eq!(collector.build_outcome(), None);
    }

    #[test]
    fn test_seeded_runs_produce_identical_weights() {
        let run = || {
            let mut collector = SampleCollector::new(
                CorpusGenerator::from_seed(Some(99)),
                ScriptedSubject::new(&[0.001]),
                RecordingProgress::default(),
                100,
            );
            collector.run(20, 64).unwrap()
        };
        assert_eq!(run().weights(), run().weights());
    }
}
