//! Row-tag XML flattening.
//!
//! Every element named `row_tag` (that is not already inside a row) becomes one
//! [`Record`]. Inside a row, child elements are flattened to dotted column paths:
//!
//! - row attributes become `_<attr>`
//! - child attributes become `<path>._<attr>`
//! - leaf text becomes `<path>`, or `<path>._VALUE` when the leaf has attributes
//! - an empty leaf without attributes becomes `Null`
//! - a path repeated within one row becomes a `List`

use std::fmt;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use feedload_core::{FieldValue, Record};

/// Column used for text that sits next to attributes or child elements.
pub const VALUE_COLUMN: &str = "_VALUE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Byte offset in the input where the problem was detected.
    pub position: usize,
    pub message: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (at byte {})", self.message, self.position)
    }
}

impl std::error::Error for ParseError {}

/// An open element inside the current row.
struct Frame {
    path: String,
    has_attrs: bool,
    has_children: bool,
    text: String,
}

/// The row element currently being assembled.
struct OpenRow {
    record: Record,
    has_children: bool,
    text: String,
    frames: Vec<Frame>,
}

impl OpenRow {
    fn start(e: &BytesStart, position: usize) -> Result<Self, ParseError> {
        let mut record = Record::new();
        for (name, value) in read_attributes(e, position)? {
            record.push_value(format!("_{}", name), FieldValue::Text(value));
        }
        Ok(Self {
            record,
            has_children: false,
            text: String::new(),
            frames: Vec::new(),
        })
    }

    fn open_child(&mut self, e: &BytesStart, position: usize) -> Result<(), ParseError> {
        let name = local_name(e);
        let path = match self.frames.last_mut() {
            Some(parent) => {
                parent.has_children = true;
                format!("{}.{}", parent.path, name)
            }
            None => {
                self.has_children = true;
                name
            }
        };

        let attrs = read_attributes(e, position)?;
        for (attr, value) in &attrs {
            self.record
                .push_value(format!("{}._{}", path, attr), FieldValue::Text(value.clone()));
        }

        self.frames.push(Frame {
            path,
            has_attrs: !attrs.is_empty(),
            has_children: false,
            text: String::new(),
        });
        Ok(())
    }

    fn push_text(&mut self, text: &str) {
        let target = match self.frames.last_mut() {
            Some(frame) => &mut frame.text,
            None => &mut self.text,
        };
        target.push_str(text);
    }

    /// Close the innermost child. Returns false when no child is open,
    /// meaning the end tag closes the row itself.
    fn close_child(&mut self) -> bool {
        let Some(frame) = self.frames.pop() else {
            return false;
        };

        let text = frame.text.trim();
        if frame.has_children {
            if !text.is_empty() {
                self.record.push_value(
                    format!("{}.{}", frame.path, VALUE_COLUMN),
                    FieldValue::Text(text.to_string()),
                );
            }
        } else if !text.is_empty() {
            let column = if frame.has_attrs {
                format!("{}.{}", frame.path, VALUE_COLUMN)
            } else {
                frame.path
            };
            self.record.push_value(column, FieldValue::Text(text.to_string()));
        } else if !frame.has_attrs {
            self.record.push_value(frame.path, FieldValue::Null);
        }
        true
    }

    fn finish(mut self) -> Record {
        let text = self.text.trim();
        if !text.is_empty() {
            self.record
                .push_value(VALUE_COLUMN, FieldValue::Text(text.to_string()));
        }
        self.record
    }
}

/// Parse every `row_tag` element in `bytes` into a flat record.
pub fn parse_records(bytes: &[u8], row_tag: &str) -> Result<Vec<Record>, ParseError> {
    // Text pieces split by comments or CDATA are joined raw and trimmed on close.
    let mut reader = Reader::from_reader(bytes);
    reader.trim_text(false);

    let mut buf = Vec::new();
    let mut records = Vec::new();
    let mut row: Option<OpenRow> = None;
    let mut depth = 0usize;
    let mut open_tag = String::new();

    loop {
        let position = reader.buffer_position();
        let event = reader.read_event_into(&mut buf).map_err(|e| ParseError {
            position,
            message: e.to_string(),
        })?;

        match event {
            Event::Start(e) => {
                depth += 1;
                match row.as_mut() {
                    Some(open) => open.open_child(&e, position)?,
                    None if local_name(&e) == row_tag => {
                        row = Some(OpenRow::start(&e, position)?);
                    }
                    None => {}
                }
                open_tag = local_name(&e);
            }

            Event::Empty(e) => match row.as_mut() {
                Some(open) => {
                    open.open_child(&e, position)?;
                    open.close_child();
                }
                None if local_name(&e) == row_tag => {
                    records.push(OpenRow::start(&e, position)?.finish());
                }
                None => {}
            },

            Event::Text(e) => {
                if let Some(open) = row.as_mut() {
                    let text = e.unescape().map_err(|err| ParseError {
                        position,
                        message: err.to_string(),
                    })?;
                    open.push_text(&text);
                }
            }

            Event::CData(e) => {
                if let Some(open) = row.as_mut() {
                    let inner = e.into_inner();
                    open.push_text(&String::from_utf8_lossy(&inner));
                }
            }

            Event::End(_) => {
                depth = depth.saturating_sub(1);
                if let Some(open) = row.as_mut() {
                    if !open.close_child() {
                        if let Some(done) = row.take() {
                            records.push(done.finish());
                        }
                    }
                }
            }

            Event::Eof => break,
            _ => {}
        }

        buf.clear();
    }

    if depth != 0 || row.is_some() {
        return Err(ParseError {
            position: reader.buffer_position(),
            message: format!("unexpected end of document inside <{}>", open_tag),
        });
    }

    Ok(records)
}

fn local_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

/// Attributes by local name, skipping namespace declarations.
fn read_attributes(e: &BytesStart, position: usize) -> Result<Vec<(String, String)>, ParseError> {
    let mut out = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| ParseError {
            position,
            message: err.to_string(),
        })?;
        if attr.key.as_ref().starts_with(b"xmlns") {
            continue;
        }
        let name = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr.unescape_value().map_err(|err| ParseError {
            position,
            message: err.to_string(),
        })?;
        out.push((name, value.into_owned()));
    }
    Ok(out)
}
