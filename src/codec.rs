//! Record codec: one record per quoted, comma-separated row under a fixed header.
//!
//! ```text
//! Timestamp,Title,JSON
//! "2025-01-01T00:00:00.000Z","My Title","[{""a"":1}]"
//! ```
//!
//! Every field is double-quoted and a literal `"` is written as `""`. Only this
//! three-column shape is accepted; unquoted fields and other delimiters are
//! rejected row by row.

use std::borrow::Cow;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use thiserror::Error;

use crate::model::{Payload, Record};

pub const HEADER: &str = "Timestamp,Title,JSON";
const COLUMNS: [&str; 3] = ["Timestamp", "Title", "JSON"];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    #[error("document body is empty")]
    Empty,
    #[error("unexpected header line: {found:?}")]
    Header { found: String },
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("row at line {line}: {reason}")]
pub struct RowError {
    pub line: usize,
    pub reason: &'static str,
}

/// Header line plus terminator, the body of an empty log.
pub fn empty_body() -> String {
    format!("{HEADER}\n")
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Encode a new record stamped with the current instant.
pub fn encode(title: &str, payload: &Value) -> String {
    encode_at(Utc::now(), title, payload)
}

pub fn encode_at(at: DateTime<Utc>, title: &str, payload: &Value) -> String {
    let timestamp = at.to_rfc3339_opts(SecondsFormat::Millis, true);
    line(&timestamp, title, &payload.to_string())
}

/// Re-encode a decoded record without touching its timestamp or raw payload text.
pub fn encode_record(record: &Record) -> String {
    line(&record.timestamp, &record.title, &record.payload.column_text())
}

pub fn encode_body(records: &[Record]) -> String {
    let mut body = empty_body();
    for record in records {
        body.push_str(&encode_record(record));
    }
    body
}

fn line(timestamp: &str, title: &str, json: &str) -> String {
    format!(
        "\"{}\",\"{}\",\"{}\"\n",
        escape(timestamp),
        escape(title),
        escape(json)
    )
}

fn escape(field: &str) -> Cow<'_, str> {
    if field.contains('"') {
        Cow::Owned(field.replace('"', "\"\""))
    } else {
        Cow::Borrowed(field)
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Validate the header and return a restartable iterator over the data rows.
pub fn rows(body: &str) -> Result<Rows<'_>, CodecError> {
    let body = body.strip_prefix('\u{feff}').unwrap_or(body);
    if body.is_empty() {
        return Err(CodecError::Empty);
    }
    let (header, rest) = match body.split_once('\n') {
        Some((header, rest)) => (header, rest),
        None => (body, ""),
    };
    let header = header.strip_suffix('\r').unwrap_or(header);
    if !header_matches(header) {
        return Err(CodecError::Header {
            found: header.to_string(),
        });
    }
    Ok(Rows { rest, line: 2 })
}

/// Decode every well-formed row in file order. Malformed rows are skipped.
pub fn decode(body: &str) -> Result<Vec<Record>, CodecError> {
    let records = rows(body)?
        .filter_map(|row| match row {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(line = e.line, reason = e.reason, "skipping malformed log row");
                None
            }
        })
        .collect();
    Ok(records)
}

fn header_matches(header: &str) -> bool {
    let names: Vec<&str> = header
        .split(',')
        .map(|name| {
            name.strip_prefix('"')
                .and_then(|n| n.strip_suffix('"'))
                .unwrap_or(name)
        })
        .collect();
    names == COLUMNS
}

#[derive(Debug, Clone)]
pub struct Rows<'a> {
    rest: &'a str,
    line: usize,
}

impl Iterator for Rows<'_> {
    type Item = Result<Record, RowError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(after) = self.rest.strip_prefix("\r\n") {
                self.rest = after;
            } else if let Some(after) = self.rest.strip_prefix('\n') {
                self.rest = after;
            } else {
                break;
            }
            self.line += 1;
        }
        if self.rest.is_empty() {
            return None;
        }

        let start = self.rest;
        let line = self.line;
        match parse_row(start) {
            Ok((fields, rest)) => {
                let consumed = &start[..start.len() - rest.len()];
                self.line += consumed.matches('\n').count();
                self.rest = rest;
                let [timestamp, title, json] = fields;
                Some(Ok(Record {
                    timestamp,
                    title,
                    payload: Payload::from_text(json),
                }))
            }
            Err(reason) => {
                // Resynchronise on the next physical line.
                self.rest = match start.split_once('\n') {
                    Some((_, rest)) => rest,
                    None => "",
                };
                self.line += 1;
                Some(Err(RowError { line, reason }))
            }
        }
    }
}

fn parse_row(input: &str) -> Result<([String; 3], &str), &'static str> {
    let (timestamp, rest) = quoted_field(input)?;
    let rest = rest
        .strip_prefix(',')
        .ok_or("expected ',' after the timestamp field")?;
    let (title, rest) = quoted_field(rest)?;
    let rest = rest
        .strip_prefix(',')
        .ok_or("expected ',' after the title field")?;
    let (json, rest) = quoted_field(rest)?;
    let rest = if rest.is_empty() {
        rest
    } else if let Some(after) = rest.strip_prefix("\r\n") {
        after
    } else if let Some(after) = rest.strip_prefix('\n') {
        after
    } else {
        return Err("unexpected text after the JSON field");
    };
    Ok(([timestamp, title, json], rest))
}

/// Read one `"..."` field, collapsing `""` to `"`. Returns the value and the remaining input.
fn quoted_field(input: &str) -> Result<(String, &str), &'static str> {
    let Some(mut rest) = input.strip_prefix('"') else {
        return Err("field is not quoted");
    };
    let mut value = String::new();
    loop {
        let Some(idx) = rest.find('"') else {
            return Err("unterminated quoted field");
        };
        value.push_str(&rest[..idx]);
        rest = &rest[idx + 1..];
        match rest.strip_prefix('"') {
            Some(after) => {
                value.push('"');
                rest = after;
            }
            None => return Ok((value, rest)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn new_year() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    fn single(body: &str) -> Record {
        let mut records = decode(body).unwrap();
        assert_eq!(records.len(), 1, "body: {body:?}");
        records.remove(0)
    }

    #[test]
    fn encodes_the_documented_line() {
        let line = encode_at(new_year(), "My Title", &json!([{"a": 1}]));
        assert_eq!(
            line,
            "\"2025-01-01T00:00:00.000Z\",\"My Title\",\"[{\"\"a\"\":1}]\"\n"
        );
    }

    #[test]
    fn every_quote_is_doubled_exactly_once() {
        let payload = json!({"k": "say \"hi\""});
        let line = encode_at(new_year(), "t", &payload);
        let json_text = payload.to_string();
        let quotes = json_text.matches('"').count();
        let field = line.rsplit_once(",\"").unwrap().1;
        let field = field.strip_suffix("\"\n").unwrap();
        assert_eq!(field.matches("\"\"").count(), quotes);
        assert_eq!(field.replace("\"\"", "\""), json_text);
    }

    #[test]
    fn round_trips_awkward_titles_and_nested_payloads() {
        let title = "He said \"cut, print\"\nthen left";
        let payload = json!({
            "nested": [{"deep": [1, 2.5, null, true]}, "x,y"],
            "empty": "",
            "quote": "\"",
        });
        let body = format!("{HEADER}\n{}", encode(title, &payload));
        let record = single(&body);
        assert_eq!(record.title, title);
        assert_eq!(record.payload, Payload::Json(payload));
        assert!(record.parsed_timestamp().is_some());
    }

    #[test]
    fn scalar_payloads_round_trip() {
        for payload in [json!(null), json!(7), json!("plain"), json!(false)] {
            let body = format!("{HEADER}\n{}", encode("s", &payload));
            assert_eq!(single(&body).payload, Payload::Json(payload));
        }
    }

    #[test]
    fn reencoding_decoded_body_is_line_equivalent() {
        let mut body = empty_body();
        body.push_str(&encode_at(new_year(), "a", &json!({"z": 1, "a": [true]})));
        body.push_str(&encode_at(new_year(), "b \"q\"", &json!("text")));
        body.push_str("\"2025-02-01T00:00:00.000Z\",\"legacy\",\"not json {\"\n");

        let records = decode(&body).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(encode_body(&records), body);
    }

    #[test]
    fn invalid_json_falls_back_to_raw_text() {
        let body = format!("{HEADER}\n\"t0\",\"legacy\",\"{{\"\"broken\"\": \"\n");
        let record = single(&body);
        assert_eq!(
            record.payload,
            Payload::Unparsed("{\"broken\": ".to_string())
        );
    }

    #[test]
    fn fallback_text_is_stable_when_stored_again_as_a_string() {
        let body = format!("{HEADER}\n\"t0\",\"legacy\",\"not json\"\n");
        let Payload::Unparsed(raw) = single(&body).payload else {
            panic!("expected unparsed payload");
        };

        let again = format!("{HEADER}\n{}", encode("legacy", &Value::String(raw.clone())));
        let first = single(&again);
        assert_eq!(first.payload, Payload::Json(Value::String(raw.clone())));

        let twice = format!("{HEADER}\n{}", encode_record(&first));
        assert_eq!(single(&twice).payload, first.payload);
    }

    #[test]
    fn header_only_body_is_an_empty_log() {
        assert!(decode("Timestamp,Title,JSON\n").unwrap().is_empty());
        assert!(decode("Timestamp,Title,JSON").unwrap().is_empty());
    }

    #[test]
    fn legacy_quoted_header_is_accepted() {
        let body = format!("\"Timestamp\",\"Title\",\"JSON\"\r\n{}", encode("x", &json!(1)));
        assert_eq!(single(&body).title, "x");
    }

    #[test]
    fn empty_body_and_drifted_header_are_rejected() {
        assert_eq!(decode(""), Err(CodecError::Empty));
        assert_eq!(
            decode("Timestamp,Title\n"),
            Err(CodecError::Header {
                found: "Timestamp,Title".to_string()
            })
        );
        assert!(matches!(
            decode("timestamp,title,json\n"),
            Err(CodecError::Header { .. })
        ));
    }

    #[test]
    fn malformed_rows_are_reported_and_skipped() {
        let good = encode_at(new_year(), "good", &json!([1]));
        let body = format!(
            "{HEADER}\n2025,unquoted,1\n{good}\"a\";\"b\";\"c\"\n\n{good}\"a\",\"b\",\"c\" trailing\n"
        );

        let results: Vec<_> = rows(&body).unwrap().collect();
        let errors: Vec<_> = results.iter().filter_map(|r| r.as_ref().err()).collect();
        assert_eq!(
            errors,
            vec![
                &RowError { line: 2, reason: "field is not quoted" },
                &RowError { line: 4, reason: "expected ',' after the timestamp field" },
                &RowError { line: 7, reason: "unexpected text after the JSON field" },
            ]
        );
        assert_eq!(decode(&body).unwrap().len(), 2);
    }

    #[test]
    fn broken_row_consumes_only_its_line() {
        let body = format!("{HEADER}\n\"open\n{}", encode("after", &json!(1)));
        let records = decode(&body).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "after");
    }

    #[test]
    fn rows_iterator_is_restartable() {
        let body = format!("{HEADER}\n{}{}", encode("A", &json!(1)), encode("B", &json!(2)));
        let rows = rows(&body).unwrap();
        let first: Vec<_> = rows.clone().map(|r| r.unwrap().title).collect();
        let second: Vec<_> = rows.map(|r| r.unwrap().title).collect();
        assert_eq!(first, vec!["A", "B"]);
        assert_eq!(first, second);
    }

    #[test]
    fn multiline_title_advances_line_numbers() {
        let body = format!("{HEADER}\n{}bad\n", encode("two\nlines", &json!(1)));
        let errors: Vec<_> = rows(&body).unwrap().filter_map(Result::err).collect();
        assert_eq!(errors, vec![RowError { line: 4, reason: "field is not quoted" }]);
    }
}
