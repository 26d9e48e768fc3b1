//! Line-oriented text format for inventory files.
//!
//! ```text
//! <count>
//! <code>,<description>,<price with 2 decimals>,<quantity>
//! ```
//!
//! [`parse`] is the strict mode used for imports: every row is validated and
//! the first bad row aborts the whole parse. [`load`] reads the persisted
//! backing file: the declared count bounds the rows read and bad rows are
//! skipped and reported instead of failing.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use super::model::{Item, normalize_code, round_price};

#[allow(clippy::expect_used)] // literal pattern
static IMPORT_CODE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^[A-Z0-9]+$").expect("valid code pattern"));

/// A rejected input line. `line` is the 1-based physical line number.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}: {reason}")]
pub struct ParseError {
    pub line: usize,
    pub reason: String,
}

impl ParseError {
    fn new(line: usize, reason: impl Into<String>) -> Self {
        Self {
            line,
            reason: reason.into(),
        }
    }
}

/// Result of reading a persisted file with [`load`].
#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub items: Vec<Item>,
    /// Rows that could not be read, in file order.
    pub skipped: Vec<ParseError>,
    /// Non-empty lines past the declared count.
    pub ignored_lines: usize,
}

/// Non-empty trimmed lines with their 1-based physical line numbers.
/// A leading byte order mark is dropped.
fn content_lines(text: &str) -> Vec<(usize, &str)> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    text.lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty())
        .collect()
}

/// Splits off a leading record-count line, if the first content line is an integer.
fn split_header<'a>(lines: &'a [(usize, &'a str)]) -> (Option<i64>, &'a [(usize, &'a str)]) {
    match lines.split_first() {
        Some(((_, first), rest)) => match first.parse::<i64>() {
            Ok(count) => (Some(count), rest),
            Err(_) => (None, lines),
        },
        None => (None, lines),
    }
}

fn parse_row(line: usize, raw: &str, enforce_code_pattern: bool) -> Result<Item, ParseError> {
    let fields: Vec<&str> = raw.split(',').map(str::trim).collect();
    if !(3..=4).contains(&fields.len()) {
        return Err(ParseError::new(
            line,
            format!(
                "expected 3 or 4 comma-separated fields (code, description, price[, quantity]), found {}",
                fields.len()
            ),
        ));
    }

    let code = normalize_code(fields[0]);
    if code.is_empty() {
        return Err(ParseError::new(line, "code is empty"));
    }
    if enforce_code_pattern && !IMPORT_CODE_PATTERN.is_match(&code) {
        return Err(ParseError::new(
            line,
            format!("code '{code}' may only contain letters A-Z and digits 0-9"),
        ));
    }

    let description = fields[1];
    if description.is_empty() {
        return Err(ParseError::new(line, "description is empty"));
    }

    let price = match fields[2].parse::<f64>() {
        Ok(price) if price.is_finite() => price,
        _ => {
            return Err(ParseError::new(
                line,
                format!("price '{}' is not a valid decimal number", fields[2]),
            ));
        }
    };
    if price < 0.0 {
        return Err(ParseError::new(line, "price must not be negative"));
    }

    let quantity = match fields.get(3) {
        None => 0,
        Some(raw_qty) => {
            let qty = raw_qty.parse::<i64>().map_err(|_| {
                ParseError::new(line, format!("quantity '{raw_qty}' is not a whole number"))
            })?;
            if qty < 0 {
                return Err(ParseError::new(line, "quantity must not be negative"));
            }
            u32::try_from(qty)
                .map_err(|_| ParseError::new(line, format!("quantity {qty} is too large")))?
        }
    };

    Ok(Item {
        code,
        description: description.to_owned(),
        price: round_price(price),
        quantity,
    })
}

/// Strict parse used by imports.
///
/// Rows are returned in file order. Codes must match `^[A-Z0-9]+$` after
/// normalization and must be unique within the file.
///
/// # Errors
/// Returns the first offending line and the reason. Input without any
/// non-empty line is rejected as empty.
pub fn parse(text: &str) -> Result<Vec<Item>, ParseError> {
    let lines = content_lines(text);
    if lines.is_empty() {
        return Err(ParseError::new(1, "file is empty"));
    }

    let (_declared, rows) = split_header(&lines);
    let mut seen: HashMap<String, usize> = HashMap::with_capacity(rows.len());
    let mut items = Vec::with_capacity(rows.len());

    for &(line, raw) in rows {
        let item = parse_row(line, raw, true)?;
        if let Some(first) = seen.insert(item.code.clone(), line) {
            return Err(ParseError::new(
                line,
                format!("duplicate code '{}' (first seen on line {first})", item.code),
            ));
        }
        items.push(item);
    }

    Ok(items)
}

/// Lenient read of the persisted backing file.
///
/// The declared count (when present) bounds how many rows are read. The code
/// pattern is not enforced since single-item adds may store codes outside it.
/// Malformed rows and repeated codes are skipped and reported.
#[must_use]
pub fn load(text: &str) -> LoadOutcome {
    let lines = content_lines(text);
    let (declared, rows) = split_header(&lines);

    let limit = declared.map_or(rows.len(), |count| {
        usize::try_from(count).unwrap_or(0).min(rows.len())
    });
    let mut outcome = LoadOutcome {
        ignored_lines: rows.len() - limit,
        ..LoadOutcome::default()
    };

    let mut seen: HashMap<String, usize> = HashMap::with_capacity(limit);
    for &(line, raw) in &rows[..limit] {
        match parse_row(line, raw, false) {
            Ok(item) => {
                if let Some(first) = seen.get(&item.code) {
                    outcome.skipped.push(ParseError::new(
                        line,
                        format!("duplicate code '{}' (first seen on line {first})", item.code),
                    ));
                } else {
                    seen.insert(item.code.clone(), line);
                    outcome.items.push(item);
                }
            }
            Err(e) => outcome.skipped.push(e),
        }
    }

    outcome
}

fn format_row(item: &Item) -> String {
    format!(
        "{},{},{:.2},{}",
        item.code, item.description, item.price, item.quantity
    )
}

/// Render items in the given order, preceded by the record count.
#[must_use]
pub fn serialize(items: &[Item]) -> String {
    std::iter::once(items.len().to_string())
        .chain(items.iter().map(format_row))
        .map(|line| line + "\n")
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(code: &str, description: &str, price: f64, quantity: u32) -> Item {
        Item {
            code: code.to_owned(),
            description: description.to_owned(),
            price,
            quantity,
        }
    }

    #[test]
    fn serialize_writes_count_then_rows() {
        let text = serialize(&[item("A1", "Anvil", 12.5, 3), item("B2", "Bucket", 4.0, 0)]);
        assert_eq!(text, "2\nA1,Anvil,12.50,3\nB2,Bucket,4.00,0\n");
    }

    #[test]
    fn serialize_empty_is_header_only() {
        assert_eq!(serialize(&[]), "0\n");
    }

    #[test]
    fn parse_reads_back_serialized_items() {
        let items = vec![
            item("A1", "Anvil", 12.5, 3),
            item("B2", "Bucket", 4.25, 0),
            item("C3", "Chisel", 0.0, 17),
        ];
        assert_eq!(parse(&serialize(&items)).unwrap(), items);
    }

    #[test]
    fn byte_order_mark_is_ignored() {
        let text = "\u{feff}1\nA1,Anvil,1.00,1\n";
        assert_eq!(parse(text).unwrap(), vec![item("A1", "Anvil", 1.0, 1)]);

        let outcome = load(text);
        assert_eq!(outcome.items, vec![item("A1", "Anvil", 1.0, 1)]);
        assert!(outcome.skipped.is_empty());
    }

    #[test]
    fn byte_order_mark_without_header_keeps_first_row() {
        let items = parse("\u{feff}A1,Anvil,1.00,1\n").unwrap();
        assert_eq!(items[0].code, "A1");
    }

    #[test]
    fn prices_are_kept_to_two_decimals() {
        let items = parse("A1,Anvil,1.239,1\n").unwrap();
        assert_eq!(items[0].price.to_bits(), 1.24_f64.to_bits());
    }

    #[test]
    fn parse_header_only_yields_empty_collection() {
        assert!(parse("0\n").unwrap().is_empty());
    }

    #[test]
    fn parse_rejects_blank_input() {
        let err = parse("  \n\n").unwrap_err();
        assert_eq!(err.line, 1);
        assert_eq!(err.reason, "file is empty");
    }

    #[test]
    fn parse_without_header_treats_every_line_as_data() {
        let items = parse("a1, Anvil ,1.5,2\nb2,Bucket,3").unwrap();
        assert_eq!(items[0], item("A1", "Anvil", 1.5, 2));
        assert_eq!(items[1], item("B2", "Bucket", 3.0, 0));
    }

    #[test]
    fn parse_ignores_declared_count_mismatch() {
        let items = parse("5\nA1,Anvil,1,1\n").unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn parse_reports_physical_line_numbers() {
        let err = parse("2\nA1,Anvil,1,1\nB2,Bucket\n").unwrap_err();
        assert_eq!(err.line, 3);
        assert!(err.reason.contains("found 2"));

        let err = parse("2\n\nA1,Anvil,1,1\n\nB2,Bucket,x\n").unwrap_err();
        assert_eq!(err.line, 5);
        assert!(err.reason.contains("price 'x'"));
    }

    #[test]
    fn parse_rejects_bad_fields() {
        let cases = [
            ("A1,Anvil,1,1,extra", "found 5"),
            (",Anvil,1,1", "code is empty"),
            ("A-1,Anvil,1,1", "may only contain"),
            ("A1, ,1,1", "description is empty"),
            ("A1,Anvil,-1,1", "must not be negative"),
            ("A1,Anvil,NaN,1", "not a valid decimal"),
            ("A1,Anvil,1,1.5", "not a whole number"),
            ("A1,Anvil,1,-2", "quantity must not be negative"),
            ("A1,Anvil,1,99999999999", "too large"),
        ];
        for (row, expected) in cases {
            let err = parse(row).unwrap_err();
            assert_eq!(err.line, 1, "row {row}");
            assert!(
                err.reason.contains(expected),
                "row {row}: '{}' should mention '{expected}'",
                err.reason
            );
        }
    }

    #[test]
    fn parse_rejects_duplicate_codes_case_insensitively() {
        let err = parse("A1,Anvil,1,1\na1,Other anvil,2,2\n").unwrap_err();
        assert_eq!(err.line, 2);
        assert!(err.reason.contains("duplicate code 'A1'"));
        assert!(err.reason.contains("line 1"));
    }

    #[test]
    fn load_honors_declared_count() {
        let outcome = load("1\nA1,Anvil,1.00,1\nB2,Bucket,2.00,2\n");
        assert_eq!(outcome.items, vec![item("A1", "Anvil", 1.0, 1)]);
        assert_eq!(outcome.ignored_lines, 1);
        assert!(outcome.skipped.is_empty());
    }

    #[test]
    fn load_accepts_codes_outside_import_pattern() {
        let outcome = load("1\nX-9,Spacer,0.10,50\n");
        assert_eq!(outcome.items[0].code, "X-9");
    }

    #[test]
    fn load_skips_bad_and_duplicate_rows() {
        let outcome = load("4\nA1,Anvil,1,1\nbroken\nA1,Again,2,2\nC3,Chisel,3,3\n");
        let codes: Vec<&str> = outcome.items.iter().map(|i| i.code.as_str()).collect();
        assert_eq!(codes, vec!["A1", "C3"]);
        let lines: Vec<usize> = outcome.skipped.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![3, 4]);
    }

    #[test]
    fn load_of_truncated_file_keeps_complete_rows() {
        let outcome = load("3\nA1,Anvil,1.00,1\nB2,Buck");
        assert_eq!(outcome.items.len(), 1);
        assert_eq!(outcome.skipped.len(), 1);
    }

    #[test]
    fn load_negative_count_reads_nothing() {
        let outcome = load("-1\nA1,Anvil,1,1\n");
        assert!(outcome.items.is_empty());
        assert_eq!(outcome.ignored_lines, 1);
    }
}
