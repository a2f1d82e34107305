//! Lazy pull parser for SOAP response bodies.
//!
//! [`RecordStream`] walks the XML event stream incrementally and yields one
//! typed record per `<return>` block, so arbitrarily large responses are
//! never materialized in memory. A `<Fault>` element anywhere in the
//! document terminates the stream with [`IngestError::SoapFault`].
//!
//! quick-xml performs no DTD processing and no external entity expansion;
//! doctype and entity-reference events are skipped unresolved.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::marker::PhantomData;

use crate::error::IngestError;
use crate::soap::client::BodyStream;
use crate::soap::records::SoapRecord;

const RETURN_ELEMENT: &str = "return";
const FAULT_ELEMENT: &str = "fault";
const FAULT_TEXT_ELEMENT: &str = "text";
const FAULT_STRING_ELEMENT: &str = "faultstring";

/// Pull iterator over the `<return>` records of one SOAP response.
pub struct RecordStream<T> {
    reader: Reader<BodyStream>,
    buf: Vec<u8>,
    max_children: usize,
    finished: bool,
    _marker: PhantomData<T>,
}

enum Frame {
    Start(String),
    End(String),
    Text(String),
    Eof,
    Other,
}

impl<T: SoapRecord> RecordStream<T> {
    pub fn new(body: BodyStream, max_children: usize) -> Self {
        let mut reader = Reader::from_reader(body);
        reader.config_mut().trim_text(true);
        Self {
            reader,
            buf: Vec::new(),
            max_children,
            finished: false,
            _marker: PhantomData,
        }
    }

    /// Yields the next record, `None` at end of document.
    pub async fn next_record(&mut self) -> Result<Option<T>, IngestError> {
        if self.finished {
            return Ok(None);
        }

        loop {
            match self.next_frame().await? {
                Frame::Start(name) if name == FAULT_ELEMENT => {
                    self.finished = true;
                    return Err(self.read_fault().await);
                }
                Frame::Start(name) if name == RETURN_ELEMENT => {
                    return Ok(Some(self.read_record().await?));
                }
                Frame::Eof => {
                    self.finished = true;
                    return Ok(None);
                }
                _ => {}
            }
        }
    }

    /// Reads one `<return>` block into a typed record.
    async fn read_record(&mut self) -> Result<T, IngestError> {
        let mut record = T::default();
        let mut children = 0usize;

        loop {
            match self.next_frame().await? {
                Frame::Start(field) => {
                    children += 1;
                    if children > self.max_children {
                        self.finished = true;
                        return Err(IngestError::Parse(format!(
                            "record exceeds max child element count {}",
                            self.max_children
                        )));
                    }
                    let text = self.read_element_text().await?;
                    let trimmed = text.trim();
                    if !trimmed.is_empty() {
                        record.assign(&field, trimmed);
                    }
                }
                Frame::End(name) if name == RETURN_ELEMENT => return Ok(record),
                Frame::Eof => {
                    self.finished = true;
                    return Err(IngestError::Parse(
                        "unexpected end of stream inside record".to_string(),
                    ));
                }
                _ => {}
            }
        }
    }

    /// Collects character content until the current element closes.
    ///
    /// Nested elements are tolerated; only their text is kept.
    async fn read_element_text(&mut self) -> Result<String, IngestError> {
        let mut depth = 0usize;
        let mut text = String::new();

        loop {
            match self.next_frame().await? {
                Frame::Text(chunk) => text.push_str(&chunk),
                Frame::Start(_) => depth += 1,
                Frame::End(_) => {
                    if depth == 0 {
                        return Ok(text);
                    }
                    depth -= 1;
                }
                Frame::Eof => {
                    self.finished = true;
                    return Err(IngestError::Parse(
                        "unexpected end of stream while reading element text".to_string(),
                    ));
                }
                Frame::Other => {}
            }
        }
    }

    /// Extracts the fault message from a `<Fault>` element.
    async fn read_fault(&mut self) -> IngestError {
        let mut message = "Unknown Fault".to_string();

        loop {
            match self.next_frame().await {
                Ok(Frame::Start(name))
                    if name == FAULT_TEXT_ELEMENT || name == FAULT_STRING_ELEMENT =>
                {
                    if let Ok(text) = self.read_element_text().await {
                        let trimmed = text.trim();
                        if !trimmed.is_empty() {
                            message = trimmed.to_string();
                        }
                    }
                    break;
                }
                Ok(Frame::End(name)) if name == FAULT_ELEMENT => break,
                Ok(Frame::Eof) | Err(_) => break,
                _ => {}
            }
        }

        IngestError::SoapFault(message)
    }

    /// Reads the next event, reduced to an owned frame so the internal
    /// buffer can be reused across calls.
    async fn next_frame(&mut self) -> Result<Frame, IngestError> {
        self.buf.clear();
        let frame = match self.reader.read_event_into_async(&mut self.buf).await {
            Ok(Event::Start(e)) => Frame::Start(lowercase_local_name(e.local_name().as_ref())),
            Ok(Event::End(e)) => Frame::End(lowercase_local_name(e.local_name().as_ref())),
            Ok(Event::Empty(_)) => Frame::Other,
            Ok(Event::Text(t)) => match t.unescape() {
                Ok(cow) => Frame::Text(cow.into_owned()),
                Err(_) => Frame::Other,
            },
            Ok(Event::CData(c)) => Frame::Text(String::from_utf8_lossy(&c.into_inner()).into_owned()),
            Ok(Event::Eof) => Frame::Eof,
            Ok(_) => Frame::Other,
            Err(err) => {
                self.finished = true;
                return Err(IngestError::Parse(format!("XML stream error: {err}")));
            }
        };
        Ok(frame)
    }
}

fn lowercase_local_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).to_ascii_lowercase()
}
