use std::path::Path;

use chrono::NaiveDate;
use regex::Regex;
use rusqlite::Connection;
use sha2::{Digest, Sha256};

use crate::db;
use crate::error::{FinError, Result};
use crate::models::{AccountKind, ParsedTransaction};
use crate::money::parse_statement_cents;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// CGD exports use a legacy single-byte encoding, not UTF-8. Latin-1 bytes
/// map 1:1 to the first 256 Unicode scalar values, so decoding is a direct
/// widening of each byte.
fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Content hash over the exact raw bytes of the uploaded file, computed
/// before any decoding. The sole duplicate-import guard.
pub fn compute_checksum(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

// ---------------------------------------------------------------------------
// Importer kinds — enum dispatch instead of trait objects
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImporterKind {
    CgdTsv,
    MoeyPdf,
}

impl ImporterKind {
    pub fn key(&self) -> &'static str {
        match self {
            Self::CgdTsv => "cgd_tsv",
            Self::MoeyPdf => "moey_pdf",
        }
    }

    #[allow(dead_code)]
    pub fn name(&self) -> &'static str {
        match self {
            Self::CgdTsv => "CGD tab-separated export",
            Self::MoeyPdf => "Moey PDF statement",
        }
    }

    pub fn detect(&self, bytes: &[u8]) -> bool {
        match self {
            Self::CgdTsv => decode_latin1(bytes).contains("Data mov."),
            Self::MoeyPdf => bytes.starts_with(b"%PDF"),
        }
    }

    pub fn parse(&self, bytes: &[u8], file_name: &str) -> Result<Vec<ParsedTransaction>> {
        match self {
            Self::CgdTsv => parse_cgd_tsv(bytes, file_name),
            Self::MoeyPdf => parse_moey_pdf(bytes),
        }
    }
}

const ALL_IMPORTERS: &[ImporterKind] = &[ImporterKind::CgdTsv, ImporterKind::MoeyPdf];

pub fn get_by_key(key: &str) -> Option<ImporterKind> {
    ALL_IMPORTERS.iter().find(|i| i.key() == key).copied()
}

pub fn detect_format(bytes: &[u8]) -> Option<ImporterKind> {
    ALL_IMPORTERS.iter().find(|i| i.detect(bytes)).copied()
}

// ---------------------------------------------------------------------------
// import entry point
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct ImportSummary {
    pub imported: usize,
    pub import_id: i64,
    pub account: String,
}

pub fn import_file(
    conn: &mut Connection,
    file_path: &Path,
    account_name: &str,
    format_key: Option<&str>,
) -> Result<ImportSummary> {
    let bytes = std::fs::read(file_path)?;
    let file_name = file_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload")
        .to_string();
    import_bytes(conn, &bytes, &file_name, account_name, format_key)
}

/// Full import flow: duplicate guard, format-specific parse, then an
/// all-or-nothing write of the import record and its transactions.
pub fn import_bytes(
    conn: &mut Connection,
    bytes: &[u8],
    file_name: &str,
    account_name: &str,
    format_key: Option<&str>,
) -> Result<ImportSummary> {
    // Check the hash before parsing: parsing a large file is wasted work on
    // a duplicate.
    let checksum = compute_checksum(bytes);
    if let Some(existing) = db::get_import_by_sha256(conn, &checksum)? {
        return Err(FinError::DuplicateImport {
            file_name: file_name.to_string(),
            original: existing.file_name,
        });
    }

    let importer = match format_key {
        Some(key) => get_by_key(key).ok_or_else(|| FinError::UnknownFormat(key.to_string()))?,
        None => detect_format(bytes).ok_or_else(|| FinError::UnknownFormat(file_name.to_string()))?,
    };

    let parsed = importer.parse(bytes, file_name)?;
    if parsed.is_empty() {
        return Err(FinError::NoTransactions(file_name.to_string()));
    }

    let tx = conn.transaction()?;
    let import = db::register_import(&tx, file_name, &checksum)?;
    let account = db::find_or_create_account(&tx, account_name, AccountKind::Bank)?;
    for row in &parsed {
        let category_id = match row.category.as_deref() {
            Some(name) => Some(db::find_or_create_category(&tx, name)?.id),
            None => None,
        };
        db::insert_transaction(
            &tx,
            row.date,
            &row.description,
            row.amount_cents,
            account.id,
            category_id,
            Some(import.id),
        )?;
    }
    tx.commit()?;

    Ok(ImportSummary {
        imported: parsed.len(),
        import_id: import.id,
        account: account.name,
    })
}

// ---------------------------------------------------------------------------
// CGD TSV parser
// ---------------------------------------------------------------------------

// Non-data lines preceding the header row in every CGD export.
const CGD_PREAMBLE_LINES: usize = 6;

struct CgdColumns {
    date: usize,
    description: usize,
    debit: usize,
    credit: usize,
    category: usize,
}

impl CgdColumns {
    fn from_header(header: &str) -> Option<Self> {
        let (mut date, mut description, mut debit, mut credit, mut category) =
            (None, None, None, None, None);
        for (i, field) in header.split('\t').enumerate() {
            match field.trim() {
                "Data mov." => date = Some(i),
                "Descrição" => description = Some(i),
                "Débito" => debit = Some(i),
                "Crédito" => credit = Some(i),
                "Categoria" => category = Some(i),
                _ => {}
            }
        }
        Some(Self {
            date: date?,
            description: description?,
            debit: debit?,
            credit: credit?,
            category: category?,
        })
    }
}

/// Outcome of decoding a single CGD data row. The two failure shapes are
/// distinct: a malformed row is the footer terminator and ends the sequence
/// normally, while an ambiguous row aborts the whole file.
enum RowOutcome {
    Parsed(ParsedTransaction),
    Ambiguous(String),
    Footer,
}

fn parse_cgd_row(record: &csv::StringRecord, cols: &CgdColumns) -> RowOutcome {
    let field = |i: usize| record.get(i).unwrap_or("").trim();

    let credit = parse_statement_cents(field(cols.credit));
    let debit = parse_statement_cents(field(cols.debit));
    let amount_cents = match (credit, debit) {
        (Some(_), Some(_)) => {
            return RowOutcome::Ambiguous(record.iter().collect::<Vec<_>>().join("\t"));
        }
        (Some(c), None) => c,
        (None, Some(d)) => -d,
        (None, None) => return RowOutcome::Footer,
    };

    let Ok(date) = NaiveDate::parse_from_str(field(cols.date), "%d-%m-%Y") else {
        return RowOutcome::Footer;
    };

    let description = field(cols.description).to_string();
    let category = match field(cols.category) {
        "" => None,
        name => Some(name.to_string()),
    };

    RowOutcome::Parsed(ParsedTransaction {
        date,
        description,
        amount_cents,
        category,
    })
}

/// Parse a CGD account-movements export: six preamble lines, a tab-delimited
/// header row, then data rows. The sequence ends at the first row that fails
/// to parse — that is how the trailing footer lines are discarded. A file
/// where no row parses at all is rejected rather than silently imported
/// empty.
pub fn parse_cgd_tsv(bytes: &[u8], file_name: &str) -> Result<Vec<ParsedTransaction>> {
    let text = decode_latin1(bytes);
    let mut lines = text.lines().skip(CGD_PREAMBLE_LINES);

    let cols = lines
        .next()
        .and_then(CgdColumns::from_header)
        .ok_or_else(|| FinError::NoTransactions(file_name.to_string()))?;

    let body = lines.collect::<Vec<_>>().join("\n");
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .from_reader(body.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let Ok(record) = record else { break };
        match parse_cgd_row(&record, &cols) {
            RowOutcome::Parsed(row) => rows.push(row),
            RowOutcome::Ambiguous(row) => {
                return Err(FinError::AmbiguousAmount {
                    file_name: file_name.to_string(),
                    row,
                });
            }
            RowOutcome::Footer => break,
        }
    }

    if rows.is_empty() {
        return Err(FinError::NoTransactions(file_name.to_string()));
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Moey PDF parser
// ---------------------------------------------------------------------------

fn parse_moey_pdf(bytes: &[u8]) -> Result<Vec<ParsedTransaction>> {
    let text = pdf_extract::extract_text_from_mem(bytes).map_err(|e| FinError::Pdf(e.to_string()))?;
    Ok(parse_moey_text(&text))
}

/// Parse the text layer of a Moey statement. Transaction lines start with
/// the movement and value dates separated by " / "; everything after the
/// value date is description tokens followed by [amount, sign, balance].
/// Lines that do not match the pattern, and matched lines whose tail does
/// not slice cleanly, are skipped — one malformed line must not abort the
/// whole statement. Moey statements carry no category column.
pub fn parse_moey_text(text: &str) -> Vec<ParsedTransaction> {
    let line_re = Regex::new(r"^\d{2}-\d{2}-\d{4} / \d{2}-\d{2}-\d{4} ").unwrap();

    let mut rows = Vec::new();
    for line in text.lines() {
        if !line_re.is_match(line) {
            continue;
        }
        let Some((movement_date, rest)) = line.split_once(" / ") else {
            continue;
        };
        let Ok(date) = NaiveDate::parse_from_str(movement_date, "%d-%m-%Y") else {
            continue;
        };
        // rest = "<value date> <description...> <amount> <sign> <balance>"
        let tokens: Vec<&str> = rest.split(' ').collect();
        if tokens.len() < 4 {
            continue;
        }
        let Some(mut amount_cents) = parse_statement_cents(tokens[tokens.len() - 3]) else {
            continue;
        };
        if tokens[tokens.len() - 2] == "-" {
            amount_cents = -amount_cents;
        }
        let description = tokens[1..tokens.len() - 3].join(" ");

        rows.push(ParsedTransaction {
            date,
            description,
            amount_cents,
            category: None,
        });
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;

    /// Encode as Latin-1 the way the bank does; every character in the CGD
    /// header fits in a single byte.
    fn latin1(s: &str) -> Vec<u8> {
        s.chars().map(|c| c as u32 as u8).collect()
    }

    const CGD_HEADER: &str = "Data mov. \tData valor \tDescrição \tDébito \tCrédito \tSaldo contabilístico \tSaldo disponível \tCategoria ";

    fn cgd_file(data_rows: &[&str], footer: &[&str]) -> Vec<u8> {
        let mut content = String::new();
        content.push_str("Consultas > Movimentos\n");
        content.push_str("Conta: 1234567890\n");
        content.push_str("Moeda: EUR\n");
        content.push_str("Data início: 01-03-2024\n");
        content.push_str("Data fim: 31-03-2024\n");
        content.push('\n');
        content.push_str(CGD_HEADER);
        content.push('\n');
        for row in data_rows {
            content.push_str(row);
            content.push('\n');
        }
        for line in footer {
            content.push_str(line);
            content.push('\n');
        }
        latin1(&content)
    }

    #[test]
    fn test_cgd_credit_row() {
        let bytes = cgd_file(
            &["01-03-2024\t01-03-2024\tSalary\t\t1.234,56\t1.234,56\t1.234,56\tIncome"],
            &[],
        );
        let rows = parse_cgd_tsv(&bytes, "march.tsv").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].amount_cents, 123_456);
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(rows[0].description, "Salary");
        assert_eq!(rows[0].category.as_deref(), Some("Income"));
    }

    #[test]
    fn test_cgd_debit_is_negated() {
        let bytes = cgd_file(
            &["02-03-2024\t02-03-2024\tSUPERMERCADO\t45,30\t\t1.189,26\t1.189,26\tFood"],
            &[],
        );
        let rows = parse_cgd_tsv(&bytes, "march.tsv").unwrap();
        assert_eq!(rows[0].amount_cents, -4530);
    }

    #[test]
    fn test_cgd_footer_terminates_sequence() {
        let bytes = cgd_file(
            &[
                "01-03-2024\t01-03-2024\tSalary\t\t1.234,56\t1.234,56\t1.234,56\tIncome",
                "02-03-2024\t02-03-2024\tSUPERMERCADO\t45,30\t\t1.189,26\t1.189,26\tFood",
            ],
            &["Saldo contabilístico\t1.189,26", "(1) Valores sujeitos a confirmação"],
        );
        let rows = parse_cgd_tsv(&bytes, "march.tsv").unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_cgd_rows_after_footer_are_not_resumed() {
        let bytes = cgd_file(
            &[
                "01-03-2024\t01-03-2024\tSalary\t\t1.234,56\t1.234,56\t1.234,56\tIncome",
                "Saldo contabilístico\t1.189,26",
                "02-03-2024\t02-03-2024\tSUPERMERCADO\t45,30\t\t1.189,26\t1.189,26\tFood",
            ],
            &[],
        );
        let rows = parse_cgd_tsv(&bytes, "march.tsv").unwrap();
        assert_eq!(rows.len(), 1, "parsing must stop at the first malformed row");
    }

    #[test]
    fn test_cgd_empty_file_is_rejected() {
        let bytes = cgd_file(&[], &["Saldo contabilístico\t0,00"]);
        let err = parse_cgd_tsv(&bytes, "empty.tsv").unwrap_err();
        assert!(matches!(err, FinError::NoTransactions(f) if f == "empty.tsv"));
    }

    #[test]
    fn test_cgd_ambiguous_row_is_fatal() {
        let bytes = cgd_file(
            &[
                "01-03-2024\t01-03-2024\tSalary\t\t1.234,56\t1.234,56\t1.234,56\tIncome",
                "02-03-2024\t02-03-2024\tWEIRD\t10,00\t20,00\t0,00\t0,00\tFood",
            ],
            &[],
        );
        let err = parse_cgd_tsv(&bytes, "march.tsv").unwrap_err();
        assert!(matches!(err, FinError::AmbiguousAmount { .. }));
    }

    #[test]
    fn test_cgd_empty_category_column() {
        let bytes = cgd_file(
            &["03-03-2024\t03-03-2024\tATM LISBOA\t20,00\t\t1.169,26\t1.169,26\t"],
            &[],
        );
        let rows = parse_cgd_tsv(&bytes, "march.tsv").unwrap();
        assert_eq!(rows[0].category, None);
    }

    #[test]
    fn test_cgd_latin1_description_survives_decoding() {
        let bytes = cgd_file(
            &["04-03-2024\t04-03-2024\tPADARIA SÃO JOÃO\t3,20\t\t1.166,06\t1.166,06\tFood"],
            &[],
        );
        let rows = parse_cgd_tsv(&bytes, "march.tsv").unwrap();
        assert_eq!(rows[0].description, "PADARIA SÃO JOÃO");
    }

    #[test]
    fn test_moey_line_parse() {
        let text = "01-04-2024 / 31-03-2024 COFFEE SHOP 12,50 - X";
        let rows = parse_moey_text(text);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].description, "COFFEE SHOP");
        assert_eq!(rows[0].amount_cents, -1250);
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());
        assert_eq!(rows[0].category, None);
    }

    #[test]
    fn test_moey_inflow_has_no_sign_marker() {
        let text = "05-04-2024 / 05-04-2024 TRANSFER FROM JOANA 250,00 + 1.021,40";
        let rows = parse_moey_text(text);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].amount_cents, 25_000);
    }

    #[test]
    fn test_moey_skips_non_transaction_lines() {
        let text = "Moey! statement\nPage 1 of 2\n\
                    01-04-2024 / 31-03-2024 COFFEE SHOP 12,50 - X\n\
                    Total balance 1.000,00";
        let rows = parse_moey_text(text);
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_moey_malformed_matched_line_is_skipped() {
        // Matched prefix but too few tokens, then a non-numeric amount slot.
        let text = "01-04-2024 / 31-03-2024 X\n\
                    02-04-2024 / 01-04-2024 SHOP twelve - X\n\
                    03-04-2024 / 02-04-2024 BAKERY 3,20 - X";
        let rows = parse_moey_text(text);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].description, "BAKERY");
    }

    #[test]
    fn test_detect_formats() {
        let cgd = cgd_file(
            &["01-03-2024\t01-03-2024\tSalary\t\t1.234,56\t1.234,56\t1.234,56\tIncome"],
            &[],
        );
        assert_eq!(detect_format(&cgd), Some(ImporterKind::CgdTsv));
        assert_eq!(detect_format(b"%PDF-1.7 ..."), Some(ImporterKind::MoeyPdf));
        assert_eq!(detect_format(b"random bytes"), None);
    }

    #[test]
    fn test_checksum_is_stable_hex_sha256() {
        let a = compute_checksum(b"hello");
        let b = compute_checksum(b"hello");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, compute_checksum(b"hello "));
    }

    #[test]
    fn test_import_bytes_persists_batch_with_categories() {
        let (_dir, mut conn) = test_db();
        let bytes = cgd_file(
            &[
                "01-03-2024\t01-03-2024\tSalary\t\t1.234,56\t1.234,56\t1.234,56\tIncome",
                "02-03-2024\t02-03-2024\tSUPERMERCADO\t45,30\t\t1.189,26\t1.189,26\tFood",
            ],
            &["Saldo contabilístico\t1.189,26"],
        );
        let summary = import_bytes(&mut conn, &bytes, "march.tsv", "CGD", None).unwrap();
        assert_eq!(summary.imported, 2);

        let count: i64 = conn
            .query_row("SELECT count(*) FROM transactions", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 2);
        let categorized: i64 = conn
            .query_row(
                "SELECT count(*) FROM transactions t JOIN categories c ON t.category_id = c.id \
                 WHERE c.name IN ('Income', 'Food')",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(categorized, 2);
    }

    #[test]
    fn test_import_bytes_rejects_byte_identical_reupload() {
        let (_dir, mut conn) = test_db();
        let bytes = cgd_file(
            &["01-03-2024\t01-03-2024\tSalary\t\t1.234,56\t1.234,56\t1.234,56\tIncome"],
            &[],
        );
        import_bytes(&mut conn, &bytes, "march.tsv", "CGD", None).unwrap();

        // Same bytes, different file name: still a duplicate.
        let err = import_bytes(&mut conn, &bytes, "march-copy.tsv", "CGD", None).unwrap_err();
        match err {
            FinError::DuplicateImport { file_name, original } => {
                assert_eq!(file_name, "march-copy.tsv");
                assert_eq!(original, "march.tsv");
            }
            other => panic!("expected DuplicateImport, got {other:?}"),
        }
        let count: i64 = conn
            .query_row("SELECT count(*) FROM transactions", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1, "second attempt must not persist anything");
    }

    #[test]
    fn test_import_bytes_ambiguous_file_persists_nothing() {
        let (_dir, mut conn) = test_db();
        let bytes = cgd_file(
            &[
                "01-03-2024\t01-03-2024\tSalary\t\t1.234,56\t1.234,56\t1.234,56\tIncome",
                "02-03-2024\t02-03-2024\tWEIRD\t10,00\t20,00\t0,00\t0,00\tFood",
            ],
            &[],
        );
        let err = import_bytes(&mut conn, &bytes, "march.tsv", "CGD", None).unwrap_err();
        assert!(matches!(err, FinError::AmbiguousAmount { .. }));
        let txns: i64 = conn
            .query_row("SELECT count(*) FROM transactions", [], |r| r.get(0))
            .unwrap();
        let imports: i64 = conn
            .query_row("SELECT count(*) FROM imports", [], |r| r.get(0))
            .unwrap();
        assert_eq!((txns, imports), (0, 0));
    }

    #[test]
    fn test_import_bytes_unknown_format() {
        let (_dir, mut conn) = test_db();
        let err = import_bytes(&mut conn, b"not a statement", "x.bin", "CGD", None).unwrap_err();
        assert!(matches!(err, FinError::UnknownFormat(_)));
        let err = import_bytes(&mut conn, b"not a statement", "x.bin", "CGD", Some("qif")).unwrap_err();
        assert!(matches!(err, FinError::UnknownFormat(_)));
    }
}
