//! CSV text for exports.
//!
//! Rules: a header line of labels, one line per row, fields joined by `,`,
//! rows joined by a single `\n` with no trailing newline. A field containing
//! a comma, double quote or line break is wrapped in double quotes, inner
//! quotes are doubled and every line break (`\r\n`, `\r`, `\n`) becomes one
//! space. The output depends only on the input: no locale formatting.

use std::borrow::Cow;

use chrono::{DateTime, SecondsFormat, Utc};

/// One exported value before stringification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Text(String),
    Int(i64),
    Timestamp(DateTime<Utc>),
}

impl Cell {
    pub fn text(value: Option<&str>) -> Self {
        value.map_or(Self::Empty, |v| Self::Text(v.to_string()))
    }

    pub fn int(value: Option<i32>) -> Self {
        value.map_or(Self::Empty, |v| Self::Int(i64::from(v)))
    }

    pub fn to_text(&self) -> Cow<'_, str> {
        match self {
            Self::Empty => Cow::Borrowed(""),
            Self::Text(s) => Cow::Borrowed(s),
            Self::Int(n) => Cow::Owned(n.to_string()),
            Self::Timestamp(ts) => Cow::Owned(ts.to_rfc3339_opts(SecondsFormat::Secs, true)),
        }
    }
}

/// Escape a single field.
pub fn escape_field(value: &str) -> Cow<'_, str> {
    if !value.contains([',', '"', '\n', '\r']) {
        return Cow::Borrowed(value);
    }

    let flattened = value.replace("\r\n", " ").replace(['\r', '\n'], " ");
    Cow::Owned(format!("\"{}\"", flattened.replace('"', "\"\"")))
}

fn write_line<'a>(out: &mut String, fields: impl IntoIterator<Item = Cow<'a, str>>) {
    for (i, field) in fields.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&escape_field(&field));
    }
}

/// Encode a header plus rows. Rows are written in the order given.
pub fn encode<R>(labels: &[&str], rows: R) -> String
where
    R: IntoIterator<Item = Vec<Cell>>,
{
    let mut out = String::new();
    write_line(&mut out, labels.iter().map(|l| Cow::Borrowed(*l)));

    for row in rows {
        out.push('\n');
        write_line(&mut out, row.iter().map(Cell::to_text));
    }

    out
}
