//! Serializable record of one run.

use super::stats::RunSummary;
use super::subject::BuildOutcome;
use crate::config::HarnessConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Schema version for run reports. Bump when changing JSON structure.
pub const REPORT_SCHEMA_VERSION: u32 = 1;

/// Machine the run was measured on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineInfo {
    /// CPU description (e.g., "AMD Ryzen 9 7950X").
    pub cpu: String,
    pub os: String,
    pub arch: String,
    pub cores: u32,
}

impl MachineInfo {
    /// Detect machine info from the current system.
    #[must_use]
    pub fn detect() -> Self {
        let cores = std::thread::available_parallelism()
            .map(std::num::NonZeroUsize::get)
            .unwrap_or(1);

        Self {
            cpu: detect_cpu_name(),
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            cores: u32::try_from(cores).unwrap_or(u32::MAX),
        }
    }
}

fn detect_cpu_name() -> String {
    #[cfg(target_os = "linux")]
    {
        if let Ok(cpuinfo) = std::fs::read_to_string("/proc/cpuinfo") {
            let model = cpuinfo
                .lines()
                .find(|line| line.starts_with("model name"))
                .and_then(|line| line.split(':').nth(1));
            if let Some(model) = model {
                return model.trim().to_string();
            }
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Ok(output) = std::process::Command::new("sysctl")
            .args(["-n", "machdep.cpu.brand_string"])
            .output()
        {
            if output.status.success() {
                return String::from_utf8_lossy(&output.stdout).trim().to_string();
            }
        }
    }

    format!("{} {}", std::env::consts::ARCH, std::env::consts::OS)
}

/// Parameters the run used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunParams {
    pub trials: u64,
    pub sample_length: usize,
    pub progress_interval: u64,
    pub seed: Option<u64>,
    pub timeout_ms: Option<u64>,
}

impl From<&HarnessConfig> for RunParams {
    fn from(config: &HarnessConfig) -> Self {
        Self {
            trials: config.trial_count,
            sample_length: config.sample_length,
            progress_interval: config.progress_interval,
            seed: config.seed,
            timeout_ms: config.timeout_ms,
        }
    }
}

/// The binary that was measured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectInfo {
    pub path: PathBuf,
    /// BLAKE3 of the executable, hex-encoded.
    pub blake3: String,
    pub build: BuildOutcome,
}

/// Complete run report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub schema_version: u32,
    pub hwprobe_version: String,
    pub machine: MachineInfo,
    pub params: RunParams,
    pub subject: SubjectInfo,
    pub summary: Option<RunSummary>,
    /// Where the scatter plot was written, if one was requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plot: Option<PathBuf>,
    /// Where the raw pairs were exported, if requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export: Option<PathBuf>,
}

impl RunReport {
    #[must_use]
    pub fn new(params: RunParams, subject: SubjectInfo, summary: Option<RunSummary>) -> Self {
        Self {
            schema_version: REPORT_SCHEMA_VERSION,
            hwprobe_version: crate::version::VERSION.to_string(),
            machine: MachineInfo::detect(),
            params,
            subject,
            summary,
            plot: None,
            export: None,
        }
    }

    #[must_use]
    pub fn with_plot(mut self, path: Option<PathBuf>) -> Self {
        self.plot = path;
        self
    }

    #[must_use]
    pub fn with_export(mut self, path: Option<PathBuf>) -> Self {
        self.export = path;
        self
    }
}
