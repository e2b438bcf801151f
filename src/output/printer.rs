use crate::output::traits::{OutputResult, Record, RecordSink};
use std::io::Write;

/// Writes records as pipe-delimited lines
///
/// Line layout: `link|name|size-bytes|seeds|leech|engine-url[|desc-link]`.
/// Unknown peer counts are printed as `-1`.
pub struct PipePrinter<W: Write> {
    writer: W,
}

impl PipePrinter<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> PipePrinter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RecordSink for PipePrinter<W> {
    fn emit(&mut self, record: &Record) -> OutputResult<()> {
        writeln!(self.writer, "{}", format_record(record))?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Formats one record as a pipe-delimited line (without newline)
pub fn format_record(record: &Record) -> String {
    let count = |value: Option<u32>| value.map_or_else(|| "-1".to_string(), |v| v.to_string());

    let mut line = [
        record.link.clone(),
        record.name.replace('|', " "),
        any_size_to_bytes(&record.size).to_string(),
        count(record.seeds),
        count(record.leech),
        record.engine_url.clone(),
    ]
    .join("|");

    if let Some(desc_link) = &record.desc_link {
        line.push('|');
        line.push_str(desc_link);
    }

    line
}

/// Converts a size string such as `1.5 GB` or `734003200` to bytes
///
/// Accepted forms are `<number> <unit>`, `<number><unit>` and a bare number
/// of bytes. The unit is identified by its first letter (T, G, M, K or B,
/// case-insensitive). Strings without a numeric part yield `-1`.
///
/// # Example
///
/// ```
/// use tracker_scout::output::any_size_to_bytes;
///
/// assert_eq!(any_size_to_bytes("1 KB"), 1024);
/// assert_eq!(any_size_to_bytes("1.5 MB"), 1_572_864);
/// assert_eq!(any_size_to_bytes("n/a"), -1);
/// ```
pub fn any_size_to_bytes(size: &str) -> i64 {
    let parts: Vec<&str> = size.split_whitespace().collect();
    let (number, unit) = match parts.as_slice() {
        [number, unit] => (number.to_string(), unit.to_string()),
        _ => {
            let trimmed = size.trim();
            let unit: String = trimmed.chars().filter(|c| c.is_alphabetic()).collect();
            let number: String = trimmed
                .chars()
                .take(trimmed.chars().count() - unit.chars().count())
                .collect();
            (number, unit)
        }
    };

    let Ok(value) = number.replace(',', ".").parse::<f64>() else {
        return -1;
    };

    let shift = match unit.chars().next().map(|c| c.to_ascii_uppercase()) {
        Some('T') => 40,
        Some('G') => 30,
        Some('M') => 20,
        Some('K') => 10,
        _ => 0,
    };

    (value * 2f64.powi(shift)) as i64
}
