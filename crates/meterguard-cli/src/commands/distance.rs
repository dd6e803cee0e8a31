//! Distance command implementation

use anyhow::Result;
use meterguard_geo::{calculate_distance, is_within_chile};

use crate::cli::DistanceArgs;
use crate::output::OutputWriter;
use crate::output_types::DistanceOutput;

pub fn execute(args: DistanceArgs, output: &OutputWriter) -> Result<()> {
    let result = DistanceOutput {
        from: args.from,
        to: args.to,
        meters: calculate_distance(&args.from, &args.to),
        from_within_chile: is_within_chile(&args.from),
        to_within_chile: is_within_chile(&args.to),
    };

    if output.is_json() {
        return output.result(result);
    }

    output.kv("From", result.from);
    output.kv("To", result.to);
    output.kv("Distance", format!("{:.1} m", result.meters));
    for (label, inside) in [("From", result.from_within_chile), ("To", result.to_within_chile)] {
        if !inside {
            output.warning(format!("{} point is outside Chile's bounding box", label));
        }
    }
    Ok(())
}
