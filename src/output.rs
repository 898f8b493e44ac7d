//! Record rendering for `openaire search` output.
//!
//! Records are written as they arrive so large result sets never have to be
//! held in memory. The JSON array format tracks whether it has opened the
//! array and emitted a first element; CSV fixes its columns from the first
//! record it sees.

use std::io::Write;

use anyhow::Result;
use serde_json::Value;

use crate::cli::OutputFormat;

enum Sink<W: Write> {
    Text(W),
    Csv(csv::Writer<W>),
}

/// Streams records to a writer in one of the supported formats.
pub struct RecordWriter<W: Write> {
    sink: Sink<W>,
    format: OutputFormat,
    written: u64,
    columns: Option<Vec<String>>,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(out: W, format: OutputFormat) -> Self {
        let sink = match format {
            OutputFormat::Csv => Sink::Csv(
                csv::WriterBuilder::new()
                    .flexible(true)
                    .terminator(csv::Terminator::Any(b'\n'))
                    .from_writer(out),
            ),
            OutputFormat::Json | OutputFormat::Jsonl => Sink::Text(out),
        };
        Self {
            sink,
            format,
            written: 0,
            columns: None,
        }
    }

    /// Records written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn write_record(&mut self, record: &Value) -> Result<()> {
        match &mut self.sink {
            Sink::Text(out) if self.format == OutputFormat::Jsonl => {
                serde_json::to_writer(&mut *out, record)?;
                writeln!(out)?;
            }
            Sink::Text(out) => {
                let separator = if self.written == 0 { "[\n" } else { ",\n" };
                out.write_all(separator.as_bytes())?;
                let pretty = serde_json::to_string_pretty(record)?;
                for (index, line) in pretty.lines().enumerate() {
                    if index > 0 {
                        writeln!(out)?;
                    }
                    write!(out, "  {line}")?;
                }
            }
            Sink::Csv(csv) => {
                let columns = self.columns.get_or_insert_with(|| record_columns(record));
                if self.written == 0 {
                    csv.write_record(columns.iter())?;
                }
                if record.is_object() {
                    csv.write_record(columns.iter().map(|column| csv_cell(record.get(column))))?;
                } else {
                    csv.write_record([csv_cell(Some(record))])?;
                }
            }
        }
        self.written += 1;
        Ok(())
    }

    /// Closes the JSON array (an empty result prints `[]`) and flushes.
    pub fn finish(self) -> Result<W> {
        let mut out = match self.sink {
            Sink::Text(mut out) => {
                if self.format == OutputFormat::Json {
                    if self.written == 0 {
                        writeln!(out, "[]")?;
                    } else {
                        writeln!(out, "\n]")?;
                    }
                }
                out
            }
            Sink::Csv(csv) => csv.into_inner().map_err(|e| e.into_error())?,
        };
        out.flush()?;
        Ok(out)
    }
}

fn record_columns(record: &Value) -> Vec<String> {
    match record {
        Value::Object(fields) => fields.keys().cloned().collect(),
        _ => vec!["value".to_string()],
    }
}

fn csv_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(format: OutputFormat, records: &[Value]) -> String {
        let mut writer = RecordWriter::new(Vec::new(), format);
        for record in records {
            writer.write_record(record).unwrap();
        }
        String::from_utf8(writer.finish().unwrap()).unwrap()
    }

    #[test]
    fn test_jsonl_one_compact_record_per_line() {
        let out = render(OutputFormat::Jsonl, &[json!({"id": "a"}), json!({"id": "b"})]);
        assert_eq!(out, "{\"id\":\"a\"}\n{\"id\":\"b\"}\n");
    }

    #[test]
    fn test_json_array_is_valid_json() {
        let records = vec![json!({"id": "a", "n": [1, 2]}), json!({"id": "b"})];
        let out = render(OutputFormat::Json, &records);
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed, Value::Array(records));
    }

    #[test]
    fn test_json_empty_result_is_empty_array() {
        assert_eq!(render(OutputFormat::Json, &[]), "[]\n");
    }

    #[test]
    fn test_csv_header_from_first_record_and_escaping() {
        let out = render(
            OutputFormat::Csv,
            &[
                json!({"id": "a", "mainTitle": "Hello, \"world\"", "pids": [{"value": "10.1/x"}]}),
                json!({"id": "b", "extra": 1}),
            ],
        );
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "id,mainTitle,pids");
        assert_eq!(
            lines[1],
            "a,\"Hello, \"\"world\"\"\",\"[{\"\"value\"\":\"\"10.1/x\"\"}]\""
        );
        assert_eq!(lines[2], "b,,");
    }

    #[test]
    fn test_csv_quotes_embedded_newlines() {
        let out = render(OutputFormat::Csv, &[json!({"abstract": "line one\nline two"})]);
        assert_eq!(out, "abstract\n\"line one\nline two\"\n");
    }

    #[test]
    fn test_csv_empty_result_prints_nothing() {
        assert_eq!(render(OutputFormat::Csv, &[]), "");
    }

    #[test]
    fn test_written_counts_records() {
        let mut writer = RecordWriter::new(Vec::new(), OutputFormat::Jsonl);
        writer.write_record(&json!(1)).unwrap();
        writer.write_record(&json!(2)).unwrap();
        assert_eq!(writer.written(), 2);
    }
}
