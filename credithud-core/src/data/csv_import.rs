//! CSV text → `Table`.
//!
//! The first record is the header. Fields are trimmed and typed by
//! `Cell::parse`; labels are kept verbatim here and trimmed later by the
//! schema normalizer.

use super::provider::SourceError;
use super::table::{Cell, Table};

/// Parse a comma-separated export with a header row.
pub fn parse_csv(input: &str) -> Result<Table, SourceError> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input.as_bytes());

    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| SourceError::MalformedCsv(format!("header row: {e}")))?
        .iter()
        .map(String::from)
        .collect();

    if columns.is_empty() {
        return Err(SourceError::MalformedCsv("missing header row".into()));
    }

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record =
            record.map_err(|e| SourceError::MalformedCsv(format!("record {}: {e}", i + 1)))?;
        rows.push(record.iter().map(Cell::parse).collect());
    }

    let table = Table::from_rows(columns, rows)
        .map_err(|e| SourceError::MalformedCsv(e.to_string()))?;

    tracing::debug!(
        columns = table.column_count(),
        rows = table.row_count(),
        "parsed CSV export"
    );
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_header_and_typed_rows() {
        let table = parse_csv("Ano,Tipo_Plano,Volume\n2024,A,100.5\n2025,B,\n").unwrap();
        assert_eq!(table.columns(), &["Ano", "Tipo_Plano", "Volume"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.cell(0, 0), Some(&Cell::Number(2024.0)));
        assert_eq!(table.cell(0, 1), Some(&Cell::Text("A".into())));
        assert_eq!(table.cell(1, 2), Some(&Cell::Missing));
    }

    #[test]
    fn keeps_label_whitespace_for_the_normalizer() {
        let table = parse_csv("X, Year ,Y\n1,2,3\n").unwrap();
        assert_eq!(table.columns()[1], " Year ");
    }

    #[test]
    fn strips_byte_order_mark() {
        let table = parse_csv("\u{feff}Ano\n2024\n").unwrap();
        assert_eq!(table.columns(), &["Ano"]);
    }

    #[test]
    fn quoted_fields_keep_commas() {
        let table = parse_csv("Grupo,Valor\n\"Silva, Filhos\",10\n").unwrap();
        assert_eq!(table.cell(0, 0), Some(&Cell::Text("Silva, Filhos".into())));
    }

    #[test]
    fn short_rows_are_padded_with_missing() {
        let table = parse_csv("a,b,c\n1\n").unwrap();
        assert_eq!(table.cell(0, 1), Some(&Cell::Missing));
        assert_eq!(table.cell(0, 2), Some(&Cell::Missing));
    }

    #[test]
    fn rejects_rows_wider_than_header() {
        let err = parse_csv("a,b\n1,2,3\n").unwrap_err();
        assert!(matches!(err, SourceError::MalformedCsv(_)));
    }

    #[test]
    fn rejects_empty_input() {
        let err = parse_csv("").unwrap_err();
        assert!(matches!(err, SourceError::MalformedCsv(_)));
    }

    #[test]
    fn header_only_yields_empty_table() {
        let table = parse_csv("Ano,Mes\n").unwrap();
        assert!(table.is_empty());
        assert_eq!(table.column_count(), 2);
    }
}
