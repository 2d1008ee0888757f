//! `glide easings` - the curve table at fixed sample points

use anyhow::{Context, Result};
use glide_animation::Easing;
use serde::Serialize;

const SAMPLES: [f64; 5] = [0.0, 0.25, 0.5, 0.75, 1.0];

#[derive(Debug, Serialize)]
struct CurveRow {
    name: &'static str,
    values: Vec<f64>,
}

fn rows() -> Vec<CurveRow> {
    Easing::ALL
        .iter()
        .map(|easing| CurveRow {
            name: easing.name(),
            values: SAMPLES.iter().map(|&t| easing.apply(t)).collect(),
        })
        .collect()
}

pub fn cmd_easings(json: bool) -> Result<()> {
    let rows = rows();

    if json {
        let text = serde_json::to_string_pretty(&rows).context("Failed to serialize curves")?;
        println!("{}", text);
        return Ok(());
    }

    print!("{:<16}", "curve");
    for t in SAMPLES {
        print!("{:>10}", format!("t={}", t));
    }
    println!();
    for row in rows {
        print!("{:<16}", row.name);
        for value in row.values {
            print!("{:>10.5}", value);
        }
        println!();
    }
    Ok(())
}
