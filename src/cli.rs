//! Defines command-line interface options using `clap` for the rastercube
//! application.

use clap::Parser;
use std::path::PathBuf;

/// A CLI tool for running data cube reductions over raster pixel samples
#[derive(Parser, Debug)]
#[command(
    version,
    name = "rastercube",
    about = "App for reducing and filtering raster sample data cubes"
)]
pub struct Args {
    /// Path to the JSON sample file ({"samples": [...], "scene_times": [...]})
    #[arg(short, long)]
    pub input: PathBuf,

    /// Reduce over a dimension with the arithmetic mean
    #[arg(long, value_name = "DIM")]
    pub mean: Option<String>,

    /// Reduce over a dimension with the sum
    #[arg(long, value_name = "DIM")]
    pub sum: Option<String>,

    /// Reduce over a dimension with the minimum
    #[arg(long, value_name = "DIM")]
    pub min: Option<String>,

    /// Reduce over a dimension with the maximum
    #[arg(long, value_name = "DIM")]
    pub max: Option<String>,

    /// Keep only these bands, comma separated
    #[arg(long, value_delimiter = ',', value_name = "BANDS")]
    pub filter_bands: Option<Vec<String>>,

    /// Keep only time steps in a half-open extent, formatted as <start>/<end>
    /// (leave a side empty for an open bound, e.g. "/2021-02-01")
    #[arg(long, value_parser = parse_extent_arg, value_name = "EXTENT")]
    pub filter_temporal: Option<ExtentSpec>,

    /// List the cube's dimensions instead of computing a result
    #[arg(long)]
    pub list_dims: bool,

    /// Enable verbose output.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

/// A half-open temporal extent from the command line
#[derive(Debug, Clone)]
pub struct ExtentSpec {
    pub start: Option<String>,
    pub end: Option<String>,
}

fn parse_extent_arg(s: &str) -> Result<ExtentSpec, String> {
    let parts: Vec<&str> = s.split('/').collect();
    let bound = |p: &str| {
        if p.is_empty() || p == ".." {
            None
        } else {
            Some(p.to_string())
        }
    };
    match parts.as_slice() {
        [start, end] => {
            let spec = ExtentSpec {
                start: bound(start),
                end: bound(end),
            };
            if spec.start.is_none() && spec.end.is_none() {
                Err("at least one bound must be given".to_string())
            } else {
                Ok(spec)
            }
        }
        _ => Err("Invalid format: Expected '<start>/<end>'.".to_string()),
    }
}
