use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default number of characters per generated sample.
pub const DEFAULT_SAMPLE_LENGTH: usize = 10_000;

/// Default number of trials per run.
pub const DEFAULT_TRIAL_COUNT: u64 = 20_000;

/// Default directory holding the subject's sources and build file.
pub const DEFAULT_SUBJECT_DIR: &str = "../C";

/// Default name of the subject executable inside the subject directory.
pub const DEFAULT_EXECUTABLE_NAME: &str = "CryptoTestC";

/// Default number of trials between progress signals.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 100;

/// Default build program, run with the subject directory as working directory.
pub const DEFAULT_BUILD_PROGRAM: &str = "make";

/// Configuration for one measurement run.
///
/// Every field has a default, so a JSON config file only needs to name the
/// values it overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    /// Characters per generated sample.
    pub sample_length: usize,

    /// Number of trials in a run.
    pub trial_count: u64,

    /// Directory the subject is built in and run from.
    pub subject_dir: PathBuf,

    /// File name of the subject executable inside `subject_dir`.
    pub executable_name: String,

    /// Emit a progress signal every this many trials.
    pub progress_interval: u64,

    /// Program used to build the subject when the executable is missing.
    pub build_program: String,

    /// Extra arguments for `build_program`.
    pub build_args: Vec<String>,

    /// Kill a subject invocation that runs longer than this. `None` waits forever.
    pub timeout_ms: Option<u64>,

    /// Seed for the corpus generator. `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            sample_length: DEFAULT_SAMPLE_LENGTH,
            trial_count: DEFAULT_TRIAL_COUNT,
            subject_dir: PathBuf::from(DEFAULT_SUBJECT_DIR),
            executable_name: DEFAULT_EXECUTABLE_NAME.to_string(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            build_program: DEFAULT_BUILD_PROGRAM.to_string(),
            build_args: Vec::new(),
            timeout_ms: None,
            seed: None,
        }
    }
}

impl HarnessConfig {
    /// Load a config from a JSON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reject values that would make a run meaningless.
    pub fn validate(&self) -> Result<(), Error> {
        if self.sample_length == 0 {
            return Err(Error::invalid_argument("sample_length must be positive"));
        }
        if self.trial_count == 0 {
            return Err(Error::invalid_argument("trial_count must be positive"));
        }
        if self.progress_interval == 0 {
            return Err(Error::invalid_argument("progress_interval must be positive"));
        }
        if self.executable_name.is_empty() {
            return Err(Error::invalid_argument("executable_name must not be empty"));
        }
        if self.build_program.is_empty() {
            return Err(Error::invalid_argument("build_program must not be empty"));
        }
        if self.timeout_ms == Some(0) {
            return Err(Error::invalid_argument("timeout_ms must be positive"));
        }
        Ok(())
    }

    /// Full path of the subject executable.
    #[must_use]
    pub fn executable_path(&self) -> PathBuf {
        self.subject_dir.join(&self.executable_name)
    }

    /// Per-invocation timeout, if any.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Resolve a relative `subject_dir` against `cwd`.
    #[must_use]
    pub fn resolved_against(mut self, cwd: &Path) -> Self {
        if self.subject_dir.is_relative() {
            self.subject_dir = cwd.join(&self.subject_dir);
        }
        self
    }

    #[must_use]
    pub fn with_sample_length(mut self, sample_length: usize) -> Self {
        self.sample_length = sample_length;
        self
    }

    #[must_use]
    pub fn with_trial_count(mut self, trial_count: u64) -> Self {
        self.trial_count = trial_count;
        self
    }

    #[must_use]
    pub fn with_subject_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.subject_dir = dir.into();
        self
    }

    #[must_use]
    pub fn with_executable_name(mut self, name: impl Into<String>) -> Self {
        self.executable_name = name.into();
        self
    }

    #[must_use]
    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Set the build command (program plus arguments).
    #[must_use]
    pub fn with_build_command(mut self, program: impl Into<String>, args: Vec<String>) -> Self {
        self.build_program = program.into();
        self.build_args = args;
        self
    }

    #[must_use]
    pub fn with_timeout_ms(mut self, timeout_ms: Option<u64>) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }
}
