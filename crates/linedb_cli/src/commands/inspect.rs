//! Inspect command implementation.

use super::{CliError, DataFile, Format};
use linedb_core::record::Record;
use linedb_core::TextEncoding;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Data file inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Data file path.
    pub path: String,
    /// File size in bytes.
    pub size: u64,
    /// Encoding the file was read with.
    pub encoding: &'static str,
    /// Number of counter headers.
    pub header_count: usize,
    /// Number of entity records.
    pub record_count: usize,
    /// Number of lines that are not valid records.
    pub malformed_lines: usize,
    /// Per-type statistics, sorted by type name.
    pub types: Vec<TypeStats>,
}

/// Statistics for a single entity type.
#[derive(Debug, Default, Serialize)]
pub struct TypeStats {
    /// Entity type name.
    pub name: String,
    /// Counter from the type's header, if any.
    pub counter: Option<u64>,
    /// Number of records.
    pub records: usize,
    /// Highest identity among the records.
    pub max_id: Option<u64>,
    /// Property names seen in the records (if requested).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Vec<String>>,
}

/// Runs the inspect command.
pub fn run(
    path: &Path,
    encoding: TextEncoding,
    show_properties: bool,
    format: &str,
) -> Result<(), CliError> {
    let format = Format::parse(format)?;
    let file = DataFile::read(path, encoding)?;
    let result = analyze(&file, encoding, show_properties);

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        Format::Text => print_text_output(&result),
    }
    Ok(())
}

/// Collects statistics over a parsed data file.
pub fn analyze(file: &DataFile, encoding: TextEncoding, show_properties: bool) -> InspectResult {
    let mut types: BTreeMap<&str, (TypeStats, BTreeSet<&str>)> = BTreeMap::new();
    let mut header_count = 0;
    let mut record_count = 0;

    for (_, record) in file.records() {
        match record {
            Record::Header { type_name, last_id } => {
                header_count += 1;
                let (stats, _) = types.entry(type_name.as_str()).or_default();
                stats.counter = Some(stats.counter.map_or(*last_id, |c| c.max(*last_id)));
            }
            Record::Entity(entity) => {
                record_count += 1;
                let (stats, properties) = types.entry(entity.type_name.as_str()).or_default();
                stats.records += 1;
                let id = entity.id.get();
                stats.max_id = Some(stats.max_id.map_or(id, |m| m.max(id)));
                properties.extend(entity.fields.iter().map(|(name, _)| name.as_str()));
            }
        }
    }

    let types = types
        .into_iter()
        .map(|(name, (mut stats, properties))| {
            stats.name = name.to_string();
            if show_properties {
                stats.properties = Some(properties.into_iter().map(String::from).collect());
            }
            stats
        })
        .collect();

    InspectResult {
        path: file.path.display().to_string(),
        size: file.size,
        encoding: encoding.name(),
        header_count,
        record_count,
        malformed_lines: file.malformed().count(),
        types,
    }
}

fn print_text_output(result: &InspectResult) {
    println!("LineDB Data File Inspection");
    println!("===========================");
    println!();
    println!("Path:     {}", result.path);
    println!("Size:     {}", format_size(result.size));
    println!("Encoding: {}", result.encoding);
    println!();
    println!("Lines:");
    println!("  Headers:   {}", result.header_count);
    println!("  Records:   {}", result.record_count);
    println!("  Malformed: {}", result.malformed_lines);

    if !result.types.is_empty() {
        println!();
        println!("Types:");
    }
    for stats in &result.types {
        let counter = stats
            .counter
            .map_or_else(|| "none".to_string(), |c| c.to_string());
        let max_id = stats
            .max_id
            .map_or_else(|| "-".to_string(), |m| m.to_string());
        println!(
            "  {}: {} records, counter {}, max id {}",
            stats.name, stats.records, counter, max_id
        );
        if let Some(properties) = &stats.properties {
            println!("    properties: {}", properties.join(", "));
        }
    }
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} bytes", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataFile {
        DataFile::parse(
            Path::new("Data.txt"),
            120,
            "#Apple:3\nApple;Id:1;color:RED\nApple;Id:3;weight:9\n\
             #Basket:1\nBasket;Id:1;apples:Apple,1,3\nPear;Id:4;variety:Bosc\nnonsense\n",
        )
    }

    #[test]
    fn counts_per_type() {
        let result = analyze(&sample(), TextEncoding::Utf8, false);
        assert_eq!(result.header_count, 2);
        assert_eq!(result.record_count, 4);
        assert_eq!(result.malformed_lines, 1);

        let names: Vec<_> = result.types.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Apple", "Basket", "Pear"]);

        let apple = &result.types[0];
        assert_eq!(apple.counter, Some(3));
        assert_eq!(apple.records, 2);
        assert_eq!(apple.max_id, Some(3));
        assert!(apple.properties.is_none());

        let pear = &result.types[2];
        assert_eq!(pear.counter, None);
        assert_eq!(pear.max_id, Some(4));
    }

    #[test]
    fn lists_properties_on_request() {
        let result = analyze(&sample(), TextEncoding::Utf8, true);
        assert_eq!(
            result.types[0].properties.as_deref(),
            Some(&["color".to_string(), "weight".to_string()][..])
        );
    }

    #[test]
    fn json_skips_absent_properties() {
        let result = analyze(&sample(), TextEncoding::Latin1, false);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["encoding"], "ISO-8859-1");
        assert!(json["types"][0].get("properties").is_none());
        assert_eq!(json["types"][1]["counter"], 1);
    }

    #[test]
    fn size_formatting() {
        assert_eq!(format_size(12), "12 bytes");
        assert_eq!(format_size(2048), "2.0 KB");
    }
}
