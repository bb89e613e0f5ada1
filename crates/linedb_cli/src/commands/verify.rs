//! Verify command implementation.

use super::{CliError, DataFile};
use linedb_core::record::Record;
use linedb_core::TextEncoding;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Verification result.
#[derive(Debug, Default)]
pub struct VerifyResult {
    /// Number of non-blank lines checked.
    pub lines_checked: usize,
    /// Number of well-formed entity records.
    pub valid_records: usize,
    /// Problems found, as `(line, description)`.
    pub problems: Vec<(usize, String)>,
}

impl VerifyResult {
    fn is_ok(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Runs the verify command.
pub fn run(path: &Path, encoding: TextEncoding) -> Result<(), CliError> {
    println!("Verifying data file {}", path.display());
    println!();

    let file = DataFile::read(path, encoding)?;
    let result = verify(&file);

    println!("  Lines checked: {}", result.lines_checked);
    println!("  Valid records: {}", result.valid_records);
    for (line, problem) in &result.problems {
        println!("  line {line}: {problem}");
    }

    println!();
    if result.is_ok() {
        println!("✓ Data file verification passed");
        Ok(())
    } else {
        println!("✗ Data file verification failed");
        Err(CliError::VerifyFailed {
            problems: result.problems.len(),
        })
    }
}

/// Checks a parsed data file.
///
/// Reports malformed lines, repeated headers, records without a header,
/// records whose identity is above their type's counter, and identities
/// used twice within a type.
pub fn verify(file: &DataFile) -> VerifyResult {
    let mut result = VerifyResult {
        lines_checked: file.lines.len(),
        ..VerifyResult::default()
    };

    for (line, error) in file.malformed() {
        result.problems.push((line, error.to_string()));
    }

    let mut counters: HashMap<&str, u64> = HashMap::new();
    for (line, record) in file.records() {
        if let Record::Header { type_name, last_id } = record {
            if counters.insert(type_name.as_str(), *last_id).is_some() {
                result
                    .problems
                    .push((line, format!("second counter header for {type_name}")));
            }
        }
    }

    let mut seen: HashSet<(&str, u64)> = HashSet::new();
    for (line, record) in file.records() {
        let Record::Entity(entity) = record else {
            continue;
        };
        let type_name = entity.type_name.as_str();
        let id = entity.id.get();
        match counters.get(type_name) {
            None => result
                .problems
                .push((line, format!("{type_name} record without a counter header"))),
            Some(&last) if id > last => result.problems.push((
                line,
                format!("{type_name} identity {id} is above its counter {last}"),
            )),
            Some(_) => {}
        }
        if seen.insert((type_name, id)) {
            result.valid_records += 1;
        } else {
            result
                .problems
                .push((line, format!("{type_name} identity {id} is used twice")));
        }
    }

    result.problems.sort_by_key(|(line, _)| *line);
    result
}
