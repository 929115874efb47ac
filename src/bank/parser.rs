//! Bank table parser.
//!
//! Decodes the published spreadsheet into a [`BankTable`].
//!
//! # Layout
//!
//! The first worksheet holds one row per prefix:
//!
//! | Bank identifier | BIC      | Bank         |
//! |-----------------|----------|--------------|
//! | 1594            | DNBANOKK | DNB Bank ASA |
//!
//! Only the first three columns are read. The header row is optional; by
//! default it is detected by checking whether the first cell of the first row
//! is a 4-digit prefix. XLS and XLSX are told apart from the file content.
//! A CSV rendition with the same columns is supported under the `source-csv`
//! feature.

use super::BankTable;
use crate::account::PREFIX_DIGITS;
use crate::error::RegistryError;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::fs;
use std::io::Cursor;
#[cfg(feature = "source-csv")]
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

/// Bank code used for rows without one under [`MissingBankCode::Sentinel`].
pub const UNKNOWN_BANK_CODE: &str = "n/a";

const COLUMNS: usize = 3;

/// How the parser treats the first row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderRow {
    /// Skip the first row unless its first cell is a 4-digit prefix.
    #[default]
    Detect,
    /// Always skip the first row.
    Present,
    /// Treat the first row as data.
    Absent,
}

/// What to do with a row whose bank code cell is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissingBankCode {
    /// Keep the row under the given placeholder bank code.
    Sentinel(String),
    /// Drop the row.
    Skip,
}

impl Default for MissingBankCode {
    fn default() -> Self {
        Self::Sentinel(UNKNOWN_BANK_CODE.to_string())
    }
}

/// Parsing quirks that differ between published table variants.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsePolicy {
    /// Header row handling.
    pub header: HeaderRow,
    /// Handling of rows without a bank code.
    pub missing_bank_code: MissingBankCode,
}

impl ParsePolicy {
    /// Builder method to set header handling.
    pub fn header(mut self, header: HeaderRow) -> Self {
        self.header = header;
        self
    }

    /// Builder method to set missing bank code handling.
    pub fn missing_bank_code(mut self, policy: MissingBankCode) -> Self {
        self.missing_bank_code = policy;
        self
    }
}

/// Encoding of the bank table file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceFormat {
    /// XLS or XLSX, detected from content.
    #[default]
    Spreadsheet,
    /// Comma separated values without quoting rules beyond RFC 4180.
    Csv,
}

/// One undecoded table row: prefix, bank code and bank name cells.
///
/// Cells are trimmed; empty cells are `None`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawRow {
    /// First column.
    pub prefix: Option<String>,
    /// Second column.
    pub bank_code: Option<String>,
    /// Third column.
    pub bank_name: Option<String>,
}

impl RawRow {
    /// Creates a row from text cells.
    pub fn new(prefix: Option<&str>, bank_code: Option<&str>, bank_name: Option<&str>) -> Self {
        Self {
            prefix: prefix.and_then(non_empty),
            bank_code: bank_code.and_then(non_empty),
            bank_name: bank_name.and_then(non_empty),
        }
    }

    fn is_blank(&self) -> bool {
        self.prefix.is_none() && self.bank_code.is_none() && self.bank_name.is_none()
    }
}

/// Parser turning bank table files into [`BankTable`]s.
#[derive(Debug, Clone, Default)]
pub struct TableParser {
    policy: ParsePolicy,
    format: SourceFormat,
}

impl TableParser {
    /// Creates a spreadsheet parser with the given policy.
    pub fn new(policy: ParsePolicy) -> Self {
        Self {
            policy,
            format: SourceFormat::Spreadsheet,
        }
    }

    /// Builder method to set the file format.
    pub fn with_format(mut self, format: SourceFormat) -> Self {
        self.format = format;
        self
    }

    /// Returns the parsing policy.
    pub fn policy(&self) -> &ParsePolicy {
        &self.policy
    }

    /// Parses the bank table file at `path`.
    ///
    /// # Errors
    ///
    /// `Io` if the file cannot be read, `Parse` if it is not a table of the
    /// expected layout or holds no prefixes.
    pub fn parse(&self, path: &Path) -> Result<BankTable, RegistryError> {
        let bytes = fs::read(path).map_err(|e| RegistryError::io(path, e))?;
        self.parse_bytes(bytes)
    }

    /// Parses a bank table held in memory.
    pub fn parse_bytes(&self, bytes: Vec<u8>) -> Result<BankTable, RegistryError> {
        match self.format {
            SourceFormat::Spreadsheet => self.parse_spreadsheet(bytes),
            #[cfg(feature = "source-csv")]
            SourceFormat::Csv => self.parse_csv(bytes.as_slice()),
            #[cfg(not(feature = "source-csv"))]
            SourceFormat::Csv => Err(RegistryError::Parse(
                "CSV bank tables require the `source-csv` feature".to_string(),
            )),
        }
    }

    /// Parses an XLS or XLSX workbook, reading its first worksheet.
    pub fn parse_spreadsheet(&self, bytes: Vec<u8>) -> Result<BankTable, RegistryError> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| RegistryError::Parse("workbook has no worksheets".to_string()))??;

        if range.width() < COLUMNS {
            return Err(RegistryError::Parse(format!(
                "expected at least {} columns, found {}",
                COLUMNS,
                range.width()
            )));
        }

        let rows = range.rows().map(|row| RawRow {
            prefix: prefix_cell(&row[0]),
            bank_code: text_cell(&row[1]),
            bank_name: text_cell(&row[2]),
        });

        non_empty_table(self.parse_rows(rows))
    }

    /// Parses a headerless or headed CSV rendition of the table.
    ///
    /// Requires the `source-csv` feature.
    #[cfg(feature = "source-csv")]
    pub fn parse_csv<R: Read>(&self, reader: R) -> Result<BankTable, RegistryError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut rows = Vec::new();
        for result in csv_reader.records() {
            let record = result?;
            rows.push(RawRow::new(record.get(0), record.get(1), record.get(2)));
        }

        non_empty_table(self.parse_rows(rows))
    }

    /// Builds a table from already decoded rows.
    ///
    /// Applies header handling and the missing bank code policy. Rows whose
    /// prefix is not exactly 4 digits are skipped.
    pub fn parse_rows<I>(&self, rows: I) -> BankTable
    where
        I: IntoIterator<Item = RawRow>,
    {
        let mut rows = rows.into_iter().peekable();

        let skip_header = match self.policy.header {
            HeaderRow::Present => true,
            HeaderRow::Absent => false,
            HeaderRow::Detect => rows
                .peek()
                .is_some_and(|row| !row.prefix.as_deref().is_some_and(is_prefix)),
        };
        if skip_header {
            rows.next();
        }

        let mut table = BankTable::new();
        let mut skipped = 0usize;

        for row in rows {
            if row.is_blank() {
                continue;
            }

            let prefix = match row.prefix {
                Some(p) if is_prefix(&p) => p,
                other => {
                    warn!(prefix = ?other, "skipping row without a 4-digit prefix");
                    skipped += 1;
                    continue;
                }
            };

            let bank_code = match (row.bank_code, &self.policy.missing_bank_code) {
                (Some(code), _) => code,
                (None, MissingBankCode::Sentinel(sentinel)) => sentinel.clone(),
                (None, MissingBankCode::Skip) => {
                    skipped += 1;
                    continue;
                }
            };

            let bank_name = row.bank_name.unwrap_or_else(|| bank_code.clone());
            table.insert(&prefix, &bank_code, &bank_name);
        }

        debug!(
            banks = table.bank_count(),
            prefixes = table.prefixes().count(),
            skipped,
            "parsed bank table"
        );

        table
    }
}

/// Returns true if `s` is exactly 4 ASCII digits.
pub fn is_prefix(s: &str) -> bool {
    s.len() == PREFIX_DIGITS && s.bytes().all(|b| b.is_ascii_digit())
}

fn non_empty_table(table: BankTable) -> Result<BankTable, RegistryError> {
    use super::BankLookup;

    if table.is_empty() {
        return Err(RegistryError::Parse(
            "bank table contains no prefixes".to_string(),
        ));
    }
    Ok(table)
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Reads a prefix cell, restoring leading zeros lost to numeric cells.
fn prefix_cell(cell: &Data) -> Option<String> {
    match cell {
        Data::Int(n) if *n >= 0 => Some(format!("{:04}", n)),
        Data::Float(f) if *f >= 0.0 && f.fract() == 0.0 => Some(format!("{:04}", *f as u64)),
        other => text_cell(other),
    }
}

fn text_cell(cell: &Data) -> Option<String> {
    match cell {
        Data::String(s) => non_empty(s),
        Data::Int(n) => Some(n.to_string()),
        Data::Float(f) => Some(f.to_string()),
        _ => None,
    }
}
