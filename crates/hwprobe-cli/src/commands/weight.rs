use super::print_json;
use hwprobe_core::harness::weight;
use miette::Result;
use serde::Serialize;

#[derive(Serialize)]
struct WeightOutput<'a> {
    text: &'a str,
    chars: usize,
    weight: u64,
}

/// Print the Hamming weight of `text`.
pub fn run(text: &str, json: bool) -> Result<()> {
    let output = WeightOutput {
        text,
        chars: text.chars().count(),
        weight: weight(text),
    };

    if json {
        print_json(&output)
    } else {
        println!("{}", output.weight);
        Ok(())
    }
}
