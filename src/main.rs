//! Entry point for the rastercube application.
//! Handles CLI parsing, sample loading, and dispatches cube operations like
//! filtering and reductions.

use clap::Parser;
use rastercube::validation::{check_parameter, ParamSpec, ParamType};
use rastercube::{DataCube, Reducer};
use serde_json::{Map, Value};
use std::fs;
mod cli;

use cli::Args;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command-line arguments
    let args = Args::parse();

    let raw = fs::read_to_string(&args.input)?;
    let input: Value = serde_json::from_str(&raw)?;

    let mut cube = load_cube(&input)?;
    if args.verbose {
        println!("Loaded cube with shape {:?} from {}", cube.shape(), args.input.display());
    }

    if args.list_dims {
        for dim in cube.dimensions() {
            println!(
                "- {} ({}, {} labels)",
                dim.name,
                dim.dimension_type.as_str(),
                dim.labels.len()
            );
        }
        return Ok(());
    }

    if let Some(bands) = &args.filter_bands {
        let names: Vec<&str> = bands.iter().map(String::as_str).collect();
        cube = cube.filter_bands(&names)?;
        if args.verbose {
            println!("Kept bands {:?}, shape {:?}", names, cube.shape());
        }
    }

    if let Some(extent) = &args.filter_temporal {
        cube = cube.filter_temporal((extent.start.as_deref(), extent.end.as_deref()), None)?;
        if args.verbose {
            println!("Filtered time steps, shape {:?}", cube.shape());
        }
    }

    let reduction = [
        (Reducer::Mean, &args.mean),
        (Reducer::Sum, &args.sum),
        (Reducer::Min, &args.min),
        (Reducer::Max, &args.max),
    ]
    .into_iter()
    .find_map(|(op, dim)| dim.as_ref().map(|d| (op, d.clone())));

    if let Some((op, dim)) = reduction {
        if args.verbose {
            println!("Computing {} over dimension '{}'", op.as_str(), dim);
        }
        cube = cube.reduce_by_dimension(|values, _labels| op.apply(values), &dim)?;
    }

    println!("{}", cube.flatten_to_array());
    Ok(())
}

/// Builds a cube from the input document: a required `samples` sequence of
/// band-name→number records plus an optional `scene_times` sequence of
/// RFC-3339 strings.
fn load_cube(input: &Value) -> Result<DataCube, Box<dyn std::error::Error>> {
    check_parameter(
        input.get("samples"),
        &ParamSpec::required("samples")
            .array()
            .types(&[ParamType::Object]),
    )?;
    check_parameter(
        input.get("scene_times"),
        &ParamSpec::optional("scene_times")
            .nullable()
            .array()
            .types(&[ParamType::String]),
    )?;

    let samples: Vec<Map<String, Value>> = input["samples"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|v| v.as_object().cloned())
        .collect();
    let scene_times: Option<Vec<String>> = input.get("scene_times").and_then(|v| {
        v.as_array().map(|times| {
            times
                .iter()
                .filter_map(|t| t.as_str().map(str::to_string))
                .collect()
        })
    });

    Ok(DataCube::from_samples(&samples, scene_times.as_deref())?)
}
