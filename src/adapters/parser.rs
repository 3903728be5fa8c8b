use crate::domain::model::BankRecord;
use crate::utils::error::{BankError, Result};

/// Columns read from the export: countryISO2, swiftCode, codeType, name, address, townName,
/// countryName and (optionally) timezone.
const REQUIRED_COLUMNS: usize = 7;

/// Parses the spreadsheet CSV export. The first row is a header and is skipped.
pub fn parse_bank_records(csv_text: &str) -> Result<Vec<BankRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_text.as_bytes());

    let mut records = Vec::new();
    for (index, row) in reader.records().enumerate() {
        let row = row?;
        // +2: 1-based numbering and the skipped header line
        let line = index + 2;

        if row.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        if row.len() < REQUIRED_COLUMNS {
            return Err(BankError::ImportError {
                message: format!(
                    "row {} has {} columns, expected at least {}",
                    line,
                    row.len(),
                    REQUIRED_COLUMNS
                ),
            });
        }

        let field = |i: usize| row.get(i).unwrap_or_default().trim().to_string();
        records.push(BankRecord {
            country_iso2: field(0),
            swift_code: field(1),
            code_type: field(2),
            name: field(3),
            address: field(4),
            town_name: field(5),
            country_name: field(6),
            time_zone: field(7),
        });
    }

    tracing::debug!("Parsed {} bank rows from CSV", records.len());
    Ok(records)
}
