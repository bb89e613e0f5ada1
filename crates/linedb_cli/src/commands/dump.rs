//! Dump command implementation.

use super::{CliError, DataFile, Format};
use linedb_codec::unescape;
use linedb_core::record::Record;
use linedb_core::TextEncoding;
use serde::Serialize;
use std::path::Path;

/// A record prepared for display.
#[derive(Debug, Serialize)]
pub struct DumpRecord {
    /// Line the record was read from.
    pub line: usize,
    /// Entity type name.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Identity.
    pub id: u64,
    /// Fields in file order, values unescaped.
    pub fields: Vec<DumpField>,
}

/// One property of a dumped record.
#[derive(Debug, Serialize)]
pub struct DumpField {
    /// Property name.
    pub name: String,
    /// Unescaped value.
    pub value: String,
}

/// Runs the dump command.
pub fn run(
    path: &Path,
    encoding: TextEncoding,
    type_name: Option<&str>,
    limit: Option<usize>,
    format: &str,
) -> Result<(), CliError> {
    let format = Format::parse(format)?;
    let file = DataFile::read(path, encoding)?;
    let records = collect(&file, type_name, limit);

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&records)?),
        Format::Text => {
            for record in &records {
                println!("{}", render_text(record));
            }
            println!();
            println!("{} record(s)", records.len());
        }
    }
    Ok(())
}

/// Selects entity records, optionally of one type, in file order.
pub fn collect(file: &DataFile, type_name: Option<&str>, limit: Option<usize>) -> Vec<DumpRecord> {
    file.records()
        .filter_map(|(line, record)| match record {
            Record::Entity(entity) => Some((line, entity)),
            Record::Header { .. } => None,
        })
        .filter(|(_, entity)| type_name.map_or(true, |name| entity.type_name == name))
        .take(limit.unwrap_or(usize::MAX))
        .map(|(line, entity)| DumpRecord {
            line,
            type_name: entity.type_name.clone(),
            id: entity.id.get(),
            fields: entity
                .fields
                .iter()
                .map(|(name, token)| DumpField {
                    name: name.clone(),
                    value: unescape(token),
                })
                .collect(),
        })
        .collect()
}

fn render_text(record: &DumpRecord) -> String {
    let mut out = format!("{}#{} (line {})", record.type_name, record.id, record.line);
    for field in &record.fields {
        out.push_str(&format!("\n  {} = {:?}", field.name, field.value));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataFile {
        DataFile::parse(
            Path::new("Data.txt"),
            0,
            "#Apple:2\nApple;Id:1;color:red#y# green\nApple;Id:2;color:a#n#b\n\
             #Basket:1\nBasket;Id:1;collectors:text,Adam,Ewa\n",
        )
    }

    #[test]
    fn unescapes_values() {
        let records = collect(&sample(), None, None);
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].fields[0].value, "red; green");
        assert_eq!(records[1].fields[0].value, "a\nb");
        assert_eq!(records[2].line, 5);
    }

    #[test]
    fn filters_by_type_and_limit() {
        let baskets = collect(&sample(), Some("Basket"), None);
        assert_eq!(baskets.len(), 1);
        assert_eq!(baskets[0].fields[0].value, "text,Adam,Ewa");

        assert_eq!(collect(&sample(), Some("Apple"), Some(1)).len(), 1);
        assert!(collect(&sample(), Some("Pear"), None).is_empty());
    }

    #[test]
    fn text_rendering() {
        let records = collect(&sample(), Some("Apple"), Some(1));
        assert_eq!(
            render_text(&records[0]),
            "Apple#1 (line 2)\n  color = \"red; green\""
        );
    }

    #[test]
    fn json_uses_type_key() {
        let records = collect(&sample(), Some("Basket"), None);
        let json = serde_json::to_value(&records).unwrap();
        assert_eq!(json[0]["type"], "Basket");
        assert_eq!(json[0]["fields"][0]["name"], "collectors");
    }
}
