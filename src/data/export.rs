use super::filter::FilteredTable;

pub const EXPORT_FILE_NAME: &str = "filtered_meals.csv";
pub const EXPORT_MIME: &str = "text/csv";

/// A CSV rendering of a filtered table, ready for a download or save dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    pub bytes: Vec<u8>,
    pub file_name: &'static str,
    pub mime: &'static str,
}

/// Serialize the filtered rows as UTF-8 CSV.
///
/// Header row first, then one line per row in table column order, with no
/// index column.  Fields are quoted only when they contain a comma, a quote
/// or a line break.  Missing values are written as empty fields and numbers
/// in their shortest round-trip form (`500.0` becomes `500`).
pub fn serialize(ft: &FilteredTable<'_>) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(Vec::new());

    writer.write_record(ft.columns())?;
    for record in ft.rows() {
        writer.write_record(record.cells.iter().map(|cell| cell.to_string()))?;
    }
    writer.flush()?;

    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

pub fn export(ft: &FilteredTable<'_>) -> Result<CsvExport, csv::Error> {
    let bytes = serialize(ft)?;
    log::info!("Exported {} rows ({} bytes) as CSV", ft.len(), bytes.len());
    Ok(CsvExport {
        bytes,
        file_name: EXPORT_FILE_NAME,
        mime: EXPORT_MIME,
    })
}
