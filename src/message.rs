//! The structured SOAP payload carried by a message context.

use crate::config::SoapVersion;
use crate::error::HandlerError;
use crate::parser::parse_envelope;
use crate::qname::QName;

/// SOAP 1.1 actor URI addressing the next node on the message path.
pub const SOAP_11_NEXT_ACTOR: &str = "http://schemas.xmlsoap.org/soap/actor/next";
/// SOAP 1.2 role addressing the next node on the message path.
pub const SOAP_12_NEXT_ROLE: &str = "http://www.w3.org/2003/05/soap-envelope/role/next";
/// SOAP 1.2 role addressing the ultimate receiver.
pub const SOAP_12_ULTIMATE_RECEIVER_ROLE: &str =
    "http://www.w3.org/2003/05/soap-envelope/role/ultimateReceiver";
/// SOAP 1.2 role no node may assume.
pub const SOAP_12_NONE_ROLE: &str = "http://www.w3.org/2003/05/soap-envelope/role/none";

/// A SOAP message with attachments.
#[derive(Debug, Clone, PartialEq)]
pub struct SoapMessage {
    version: SoapVersion,
    header_blocks: Vec<HeaderBlock>,
    body_element: Option<QName>,
    envelope_xml: String,
    attachments: Vec<Attachment>,
}

/// A direct child of the SOAP Header.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderBlock {
    /// Element name
    pub name: QName,
    /// `actor` (1.1) or `role` (1.2) attribute
    pub actor: Option<String>,
    /// `mustUnderstand` attribute
    pub must_understand: bool,
}

impl HeaderBlock {
    /// Whether this block is addressed to a node acting in `roles`.
    ///
    /// The node is treated as the ultimate receiver, so blocks without an
    /// actor are always targeted.
    pub fn is_targeted_at(&self, roles: &[String]) -> bool {
        match self.actor.as_deref() {
            None | Some(SOAP_11_NEXT_ACTOR | SOAP_12_NEXT_ROLE | SOAP_12_ULTIMATE_RECEIVER_ROLE) => {
                true
            }
            Some(SOAP_12_NONE_ROLE) => false,
            Some(actor) => roles.iter().any(|role| role == actor),
        }
    }
}

/// A MIME part travelling with the envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub content_id: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

impl Attachment {
    pub fn new(
        content_id: impl Into<String>,
        content_type: impl Into<String>,
        content: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            content_id: content_id.into(),
            content_type: content_type.into(),
            content: content.into(),
        }
    }
}

impl SoapMessage {
    pub(crate) fn from_parts(
        version: SoapVersion,
        header_blocks: Vec<HeaderBlock>,
        body_element: Option<QName>,
        envelope_xml: String,
    ) -> Self {
        Self {
            version,
            header_blocks,
            body_element,
            envelope_xml,
            attachments: Vec::new(),
        }
    }

    /// Read a SOAP envelope from raw bytes.
    pub fn from_xml(data: &[u8]) -> Result<Self, HandlerError> {
        parse_envelope(data)
    }

    pub fn version(&self) -> SoapVersion {
        self.version
    }

    pub fn header_blocks(&self) -> &[HeaderBlock] {
        &self.header_blocks
    }

    /// Name of the first Body child (the RPC operation or fault).
    pub fn body_element(&self) -> Option<&QName> {
        self.body_element.as_ref()
    }

    /// The envelope as it was read.
    pub fn as_xml(&self) -> &str {
        &self.envelope_xml
    }

    /// Envelope bytes plus attachment content bytes.
    pub fn size(&self) -> usize {
        self.envelope_xml.len()
            + self
                .attachments
                .iter()
                .map(|a| a.content.len())
                .sum::<usize>()
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    pub fn attachment(&self, content_id: &str) -> Option<&Attachment> {
        self.attachments.iter().find(|a| a.content_id == content_id)
    }

    pub fn add_attachment(&mut self, attachment: Attachment) {
        self.attachments.push(attachment);
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.add_attachment(attachment);
        self
    }
}

/// Conversion of a payload into the context's message representation.
pub trait IntoSoapMessage {
    fn into_soap_message(self) -> Result<SoapMessage, HandlerError>;
}

impl IntoSoapMessage for SoapMessage {
    fn into_soap_message(self) -> Result<SoapMessage, HandlerError> {
        Ok(self)
    }
}

impl IntoSoapMessage for &[u8] {
    fn into_soap_message(self) -> Result<SoapMessage, HandlerError> {
        SoapMessage::from_xml(self)
    }
}

impl IntoSoapMessage for Vec<u8> {
    fn into_soap_message(self) -> Result<SoapMessage, HandlerError> {
        SoapMessage::from_xml(&self)
    }
}

impl IntoSoapMessage for &str {
    fn into_soap_message(self) -> Result<SoapMessage, HandlerError> {
        SoapMessage::from_xml(self.as_bytes())
    }
}

impl IntoSoapMessage for String {
    fn into_soap_message(self) -> Result<SoapMessage, HandlerError> {
        SoapMessage::from_xml(self.as_bytes())
    }
}
