use super::print_json;
use hwprobe_core::{read_json, ScatterPlot, Visualizer};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Serialize)]
struct PlotOutput {
    input: PathBuf,
    plot: PathBuf,
    trials: usize,
}

/// Re-render a scatter plot from an exported JSON result set.
pub fn run(cwd: &Path, input: &Path, out: &Path, json: bool) -> Result<()> {
    let input = cwd.join(input);
    let out = cwd.join(out);

    let results = read_json(&input).into_diagnostic()?;
    ScatterPlot::new(&out).render(&results).into_diagnostic()?;
    info!(path = %out.display(), trials = results.len(), "wrote scatter plot");

    let output = PlotOutput {
        input,
        plot: out,
        trials: results.len(),
    };
    if json {
        print_json(&output)
    } else {
        println!(
            "Plotted {} trials from {} to {}",
            output.trials,
            output.input.display(),
            output.plot.display()
        );
        Ok(())
    }
}
