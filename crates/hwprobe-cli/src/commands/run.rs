use super::print_json;
use hwprobe_core::harness::{
    summarize, BuildOutcome, CorpusGenerator, ProcessSubject, ProgressSink, RunParams, RunReport,
    SampleCollector, SubjectInfo,
};
use hwprobe_core::{export, HarnessConfig, ScatterPlot, Visualizer};
use hwprobe_util::hash::fingerprint_file;
use miette::{IntoDiagnostic, Result};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Command-line overrides for a run. `None` keeps the config file or default value.
#[derive(Debug, Default)]
pub struct RunOptions {
    pub config: Option<PathBuf>,
    pub trials: Option<u64>,
    pub length: Option<usize>,
    pub subject_dir: Option<PathBuf>,
    pub exe: Option<String>,
    pub build_cmd: Option<String>,
    pub build_args: Vec<String>,
    pub progress_every: Option<u64>,
    pub seed: Option<u64>,
    pub timeout_ms: Option<u64>,
    pub plot: Option<PathBuf>,
    pub out: Option<PathBuf>,
}

impl RunOptions {
    fn into_config(self, cwd: &Path) -> Result<(HarnessConfig, Option<PathBuf>, Option<PathBuf>)> {
        let mut config = match &self.config {
            Some(path) => HarnessConfig::load(&cwd.join(path)).into_diagnostic()?,
            None => HarnessConfig::default(),
        };

        if let Some(trials) = self.trials {
            config = config.with_trial_count(trials);
        }
        if let Some(length) = self.length {
            config = config.with_sample_length(length);
        }
        if let Some(dir) = self.subject_dir {
            config = config.with_subject_dir(dir);
        }
        if let Some(exe) = self.exe {
            config = config.with_executable_name(exe);
        }
        if let Some(program) = self.build_cmd {
            config = config.with_build_command(program, self.build_args);
        } else if !self.build_args.is_empty() {
            config.build_args = self.build_args;
        }
        if let Some(interval) = self.progress_every {
            config = config.with_progress_interval(interval);
        }
        if self.seed.is_some() {
            config = config.with_seed(self.seed);
        }
        if self.timeout_ms.is_some() {
            config = config.with_timeout_ms(self.timeout_ms);
        }

        let config = config.resolved_against(cwd);
        config.validate().into_diagnostic()?;

        let plot = self.plot.map(|p| cwd.join(p));
        let out = self.out.map(|p| cwd.join(p));
        Ok((config, plot, out))
    }
}

/// Progress for an operator at a terminal.
///
/// Prints `Iteration N` to stdout unless stdout is reserved for JSON.
struct ConsoleProgress {
    print: bool,
}

impl ProgressSink for ConsoleProgress {
    fn build_started(&mut self, dir: &Path) {
        info!(dir = %dir.display(), "subject executable missing, building");
    }

    fn iteration(&mut self, index: u64, total: u64) {
        debug!(iteration = index, total, "progress");
        if self.print {
            println!("Iteration {index}");
        }
    }

    fn finished(&mut self, total: u64) {
        info!(trials = total, "all trials complete");
    }
}

/// Run the measurement, then plot/export as requested and print a report.
pub fn run(cwd: &Path, options: RunOptions, json: bool) -> Result<()> {
    let (config, plot_path, out_path) = options.into_config(cwd)?;

    info!(
        trials = config.trial_count,
        sample_length = config.sample_length,
        subject = %config.executable_path().display(),
        "starting run"
    );

    let subject = ProcessSubject::from_config(&config).into_diagnostic()?;
    let executable = subject.executable_path();

    let mut collector = SampleCollector::new(
        CorpusGenerator::from_seed(config.seed),
        subject,
        ConsoleProgress { print: !json },
        config.progress_interval,
    );
    let results = collector
        .run(config.trial_count, config.sample_length)
        .into_diagnostic()?;
    let build = collector
        .build_outcome()
        .unwrap_or(BuildOutcome::AlreadyPresent);

    let blake3 = fingerprint_file(&executable).into_diagnostic()?;

    if let Some(path) = &plot_path {
        ScatterPlot::new(path).render(&results).into_diagnostic()?;
        info!(path = %path.display(), "wrote scatter plot");
    }
    if let Some(path) = &out_path {
        let format = export(&results, path).into_diagnostic()?;
        info!(path = %path.display(), ?format, "exported results");
    }

    let report = RunReport::new(
        RunParams::from(&config),
        SubjectInfo {
            path: executable,
            blake3,
            build,
        },
        summarize(&results),
    )
    .with_plot(plot_path)
    .with_export(out_path);

    if json {
        print_json(&report)
    } else {
        print_human(&report)
    }
}

fn print_human(report: &RunReport) -> Result<()> {
    let mut out = io::stdout().lock();

    writeln!(out).into_diagnostic()?;
    writeln!(out, "\x1b[1mhwprobe run\x1b[0m").into_diagnostic()?;
    writeln!(
        out,
        "Machine: {} ({} cores, {})",
        report.machine.cpu, report.machine.cores, report.machine.os
    )
    .into_diagnostic()?;

    let build = match report.subject.build {
        BuildOutcome::Built => "built this run",
        BuildOutcome::AlreadyPresent => "prebuilt",
    };
    writeln!(
        out,
        "Subject: {} ({build}, blake3 {})",
        report.subject.path.display(),
        &report.subject.blake3[..report.subject.blake3.len().min(16)]
    )
    .into_diagnostic()?;

    let seed = report
        .params
        .seed
        .map_or_else(|| "random".to_string(), |s| s.to_string());
    writeln!(
        out,
        "Trials: {} x {} chars (seed: {seed})",
        report.params.trials, report.params.sample_length
    )
    .into_diagnostic()?;
    writeln!(out).into_diagnostic()?;

    if let Some(summary) = &report.summary {
        writeln!(
            out,
            "{:<12} min={:<10} max={:<10} mean={:.1}",
            "Weight", summary.weight_min, summary.weight_max, summary.weight_mean
        )
        .into_diagnostic()?;
        writeln!(
            out,
            "{:<12} median={:<10} p95={:<10} \x1b[90mmin={:<10} max={:<10}\x1b[0m",
            "Duration",
            format_duration(summary.duration.median_ns),
            format_duration(summary.duration.p95_ns),
            format_duration(summary.duration.min_ns),
            format_duration(summary.duration.max_ns),
        )
        .into_diagnostic()?;
        let r = summary
            .correlation
            .map_or_else(|| "n/a".to_string(), |r| format!("{r:+.4}"));
        writeln!(out, "{:<12} r={r} (Pearson, weight vs duration)", "Correlation")
            .into_diagnostic()?;
    }

    if report.plot.is_some() || report.export.is_some() {
        writeln!(out).into_diagnostic()?;
    }
    if let Some(plot) = &report.plot {
        writeln!(out, "Plot: {}", plot.display()).into_diagnostic()?;
    }
    if let Some(export) = &report.export {
        writeln!(out, "Data: {}", export.display()).into_diagnostic()?;
    }

    out.flush().into_diagnostic()?;
    Ok(())
}

/// Format a duration in nanoseconds to a human-readable string.
fn format_duration(ns: u64) -> String {
    if ns >= 1_000_000_000 {
        format!("{:.2}s", ns as f64 / 1_000_000_000.0)
    } else if ns >= 1_000_000 {
        format!("{:.2}ms", ns as f64 / 1_000_000.0)
    } else if ns >= 1_000 {
        format!("{:.2}us", ns as f64 / 1_000.0)
    } else {
        format!("{ns}ns")
    }
}
