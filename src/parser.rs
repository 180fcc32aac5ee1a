//! SOAP envelope reading.
//!
//! Only identifies the envelope: version, header blocks and the first Body
//! child. Uses quick-xml, which never expands external entities; DOCTYPE
//! declarations are rejected outright.

use crate::config::SoapVersion;
use crate::error::HandlerError;
use crate::message::{HeaderBlock, SoapMessage};
use crate::qname::QName;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;
use std::fmt::Display;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Section {
    #[default]
    Outside,
    Header,
    Body,
}

#[derive(Debug, Default)]
struct EnvelopeScanner {
    version: Option<SoapVersion>,
    section: Section,
    has_body: bool,
    header_blocks: Vec<HeaderBlock>,
    body_element: Option<QName>,
}

impl EnvelopeScanner {
    fn open(
        &mut self,
        reader: &NsReader<&[u8]>,
        ns: Option<String>,
        e: &BytesStart,
        depth: usize,
    ) -> Result<(), HandlerError> {
        let local = local_name(e)?;

        match depth {
            0 => {
                if self.version.is_some() {
                    return Err(invalid("multiple root elements"));
                }
                if local != "Envelope" {
                    return Err(invalid(format!("root element {} is not a SOAP Envelope", local)));
                }
                let version = ns.as_deref().and_then(SoapVersion::from_namespace).ok_or_else(|| {
                    invalid(format!(
                        "unrecognized SOAP envelope namespace: {}",
                        ns.as_deref().unwrap_or("(none)")
                    ))
                })?;
                self.version = Some(version);
            }
            1 => {
                let in_envelope_ns = ns.as_deref() == self.version.map(|v| v.namespace());
                match (in_envelope_ns, local.as_str()) {
                    (true, "Header") if !self.has_body => self.section = Section::Header,
                    (true, "Body") => {
                        self.section = Section::Body;
                        self.has_body = true;
                    }
                    _ => self.section = Section::Outside,
                }
            }
            2 => match self.section {
                Section::Header => {
                    let block = self.header_block(reader, ns, local, e)?;
                    self.header_blocks.push(block);
                }
                Section::Body if self.body_element.is_none() => {
                    self.body_element = Some(QName::new(ns.unwrap_or_default(), local));
                }
                _ => {}
            },
            _ => {}
        }

        Ok(())
    }

    fn header_block(
        &self,
        reader: &NsReader<&[u8]>,
        ns: Option<String>,
        local: String,
        e: &BytesStart,
    ) -> Result<HeaderBlock, HandlerError> {
        let version = self
            .version
            .ok_or_else(|| invalid("header block outside of an envelope"))?;

        let mut block = HeaderBlock {
            name: QName::new(ns.unwrap_or_default(), local),
            actor: None,
            must_understand: false,
        };

        for attr in e.attributes() {
            let attr = attr.map_err(xml_error)?;
            let (attr_ns, attr_local) = reader.resolve_attribute(attr.key);
            if namespace_uri(attr_ns)?.as_deref() != Some(version.namespace()) {
                continue;
            }

            let value = attr.unescape_value().map_err(xml_error)?;
            match (attr_local.as_ref(), version) {
                (b"actor", SoapVersion::Soap11) | (b"role", SoapVersion::Soap12) => {
                    block.actor = Some(value.into_owned());
                }
                (b"mustUnderstand", _) => {
                    block.must_understand = matches!(value.trim(), "1" | "true");
                }
                _ => {}
            }
        }

        Ok(block)
    }
}

/// Read raw bytes as a SOAP envelope.
pub fn parse_envelope(data: &[u8]) -> Result<SoapMessage, HandlerError> {
    let xml_str = std::str::from_utf8(data)
        .map_err(|e| invalid(format!("Invalid UTF-8: {}", e)))?;

    let mut reader = NsReader::from_str(xml_str);
    reader.config_mut().trim_text(true);

    let mut scanner = EnvelopeScanner::default();
    let mut depth = 0usize;

    loop {
        let (resolved, event) = reader.read_resolved_event().map_err(xml_error)?;
        let ns = namespace_uri(resolved)?;

        match event {
            Event::Start(ref e) => {
                scanner.open(&reader, ns, e, depth)?;
                depth += 1;
            }
            Event::Empty(ref e) => {
                scanner.open(&reader, ns, e, depth)?;
                if depth == 1 {
                    scanner.section = Section::Outside;
                }
            }
            Event::End(_) => {
                depth = depth.saturating_sub(1);
                if depth == 1 {
                    scanner.section = Section::Outside;
                }
            }
            Event::DocType(_) => {
                return Err(invalid("DOCTYPE declarations are not allowed"));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if depth != 0 {
        return Err(invalid("unexpected end of document"));
    }

    let version = scanner
        .version
        .ok_or_else(|| invalid("No SOAP Envelope found"))?;

    if !scanner.has_body {
        return Err(invalid("SOAP Envelope has no Body"));
    }

    Ok(SoapMessage::from_parts(
        version,
        scanner.header_blocks,
        scanner.body_element,
        xml_str.to_string(),
    ))
}

fn namespace_uri(resolved: ResolveResult<'_>) -> Result<Option<String>, HandlerError> {
    match resolved {
        ResolveResult::Bound(Namespace(ns)) => Ok(Some(String::from_utf8_lossy(ns).into_owned())),
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => Err(invalid(format!(
            "unknown namespace prefix: {}",
            String::from_utf8_lossy(&prefix)
        ))),
    }
}

fn local_name(e: &BytesStart) -> Result<String, HandlerError> {
    let name = e.local_name();
    std::str::from_utf8(name.as_ref())
        .map(str::to_string)
        .map_err(|e| invalid(format!("Invalid UTF-8 in element name: {}", e)))
}

fn invalid(message: impl Into<String>) -> HandlerError {
    HandlerError::InvalidPayload(message.into())
}

fn xml_error(e: impl Display) -> HandlerError {
    invalid(format!("XML parse error: {}", e))
}
