//! Config command implementation

use anyhow::Result;
use meterguard_core::config::LayeredConfig;

use crate::output::OutputWriter;
use crate::output_types::{ConfigEntry, ConfigRow};

pub fn execute(config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let mut entries: Vec<ConfigEntry> = config
        .to_inspection_map()
        .into_iter()
        .map(|(key, (value, source))| ConfigEntry { key, value, source })
        .collect();
    entries.sort_by(|a, b| a.key.cmp(&b.key));

    if output.is_json() {
        return output.result(entries);
    }

    output.section("Effective Configuration");
    output.table(entries.iter().map(ConfigRow::from));
    Ok(())
}
