//! `biogate sensors`

use super::load_config;
use anyhow::Result;
use biogate_service::parse_sensor_configs;
use std::fmt::Write;
use std::path::Path;

/// List the descriptors a configuration declares, in input order.
pub fn run(path: &Path, json: bool) -> Result<String> {
    let config = load_config(path)?;
    let parsed = parse_sensor_configs(config.legacy_sensor_strings());

    if json {
        let mut out = serde_json::to_string_pretty(&parsed.descriptors)?;
        out.push('\n');
        return Ok(out);
    }

    let mut out = String::new();
    writeln!(out, "{:>4}  {:<12} {:<12}", "ID", "MODALITY", "STRENGTH")?;
    for descriptor in &parsed.descriptors {
        writeln!(
            out,
            "{:>4}  {:<12} {:<12}",
            descriptor.id(),
            descriptor.modality().as_str(),
            descriptor.strength().as_str()
        )?;
    }
    if !parsed.rejected.is_empty() {
        writeln!(out, "({} entries skipped)", parsed.rejected.len())?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_lists_sensors_in_order() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "sensors = [\"4:8:0xfff\", \"0:2:15\", \"x\"]\n").unwrap();

        let out = run(file.path(), false).unwrap();
        let rows: Vec<&str> = out.lines().skip(1).collect();
        assert!(rows[0].contains("face") && rows[0].contains("convenience"));
        assert!(rows[1].contains("fingerprint") && rows[1].contains("strong"));
        assert_eq!(rows[2], "(1 entries skipped)");
    }

    #[test]
    fn test_json_output() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "sensors = [\"1:4:255\"]\n").unwrap();

        let out = run(file.path(), true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value[0]["id"], 1);
        assert_eq!(value[0]["modality"], "Iris");
    }
}
