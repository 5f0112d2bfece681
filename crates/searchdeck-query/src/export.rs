//! Result-set export: CSV with a header row over the key union, and a JSON
//! array preserving keys as produced.

use searchdeck_core::types::ResultRecord;

/// Column set is the union of keys across records, in first-seen order.
pub fn column_union(records: &[ResultRecord]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for record in records {
        for key in record.keys() {
            if !columns.iter().any(|existing| existing == key) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

/// Header row plus one row per record; keys a record lacks render empty.
pub fn to_csv(records: &[ResultRecord]) -> String {
    let columns = column_union(records);
    let mut out = String::new();
    push_row(&mut out, columns.iter().map(String::as_str));
    for record in records {
        let fields: Vec<String> = columns
            .iter()
            .map(|column| record.get(column).map(render_value).unwrap_or_default())
            .collect();
        push_row(&mut out, fields.iter().map(String::as_str));
    }
    out
}

/// Pretty-printed array of objects, one per record.
pub fn to_json(records: &[ResultRecord]) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

fn push_row<'a>(out: &mut String, fields: impl Iterator<Item = &'a str>) {
    let mut first = true;
    for field in fields {
        if !first {
            out.push(',');
        }
        first = false;
        out.push_str(&escape_field(field));
    }
    out.push('\n');
}

/// Strings render bare, null renders empty, everything else renders as
/// compact JSON.
fn render_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn record(pairs: &[(&str, Value)]) -> ResultRecord {
        let mut record = ResultRecord::new();
        for (key, value) in pairs {
            record.insert((*key).to_string(), value.clone());
        }
        record
    }

    /// Minimal RFC-4180 reader, enough to verify our own output.
    fn parse_csv(text: &str) -> Vec<Vec<String>> {
        let mut rows = Vec::new();
        let mut row = Vec::new();
        let mut field = String::new();
        let mut in_quotes = false;
        let mut chars = text.chars().peekable();
        while let Some(c) = chars.next() {
            if in_quotes {
                if c == '"' {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                } else {
                    field.push(c);
                }
            } else {
                match c {
                    '"' => in_quotes = true,
                    ',' => row.push(std::mem::take(&mut field)),
                    '\n' => {
                        row.push(std::mem::take(&mut field));
                        rows.push(std::mem::take(&mut row));
                    }
                    _ => field.push(c),
                }
            }
        }
        if !field.is_empty() || !row.is_empty() {
            row.push(field);
            rows.push(row);
        }
        rows
    }

    #[test]
    fn columns_are_the_union_of_keys_in_first_seen_order() {
        let records = vec![
            record(&[("id", Value::String("a".into())), ("title", Value::String("one".into()))]),
            record(&[("title", Value::String("two".into())), ("url", Value::String("u".into()))]),
        ];
        assert_eq!(column_union(&records), ["id", "title", "url"]);
    }

    #[test]
    fn missing_keys_render_empty_cells() {
        let records = vec![
            record(&[("id", Value::String("a".into())), ("title", Value::String("one".into()))]),
            record(&[("title", Value::String("two".into()))]),
        ];
        let csv = to_csv(&records);
        let rows = parse_csv(&csv);
        assert_eq!(rows[0], ["id", "title"]);
        assert_eq!(rows[2], ["", "two"]);
    }

    #[test]
    fn csv_round_trip_preserves_keys_and_scalar_values() {
        let records = vec![record(&[
            ("id", Value::String("abc-123".into())),
            ("score", serde_json::json!(0.8731)),
            ("title", Value::String("comma, \"quote\" and\nnewline".into())),
        ])];
        let csv = to_csv(&records);
        let rows = parse_csv(&csv);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], ["id", "score", "title"]);
        assert_eq!(rows[1][0], "abc-123");
        assert_eq!(rows[1][1], "0.8731");
        assert_eq!(rows[1][2], "comma, \"quote\" and\nnewline");
    }

    #[test]
    fn nested_values_render_as_compact_json() {
        let records = vec![record(&[("tags", serde_json::json!(["a", "b"]))])];
        let csv = to_csv(&records);
        let rows = parse_csv(&csv);
        assert_eq!(rows[1][0], "[\"a\",\"b\"]");
    }

    #[test]
    fn json_export_preserves_key_order() {
        let records = vec![record(&[
            ("id", Value::String("a".into())),
            ("score", serde_json::json!(0.5)),
            ("title", Value::String("one".into())),
        ])];
        let json = to_json(&records).expect("serialize");
        let id_at = json.find("\"id\"").expect("id key");
        let score_at = json.find("\"score\"").expect("score key");
        let title_at = json.find("\"title\"").expect("title key");
        assert!(id_at < score_at && score_at < title_at);
    }
}
