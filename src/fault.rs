//! SOAP fault values raised by handlers.

use crate::config::SoapVersion;
use crate::qname::QName;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A SOAP fault.
///
/// `code` gives the algorithmic classification of the fault, `string` is a
/// human-readable description not meant for branching, `actor` names the
/// node that raised it and `detail` carries application data related to the
/// SOAP Body. All four values are fixed at construction.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{string}")]
pub struct SoapFault {
    code: QName,
    string: String,
    actor: Option<String>,
    detail: Option<Detail>,
}

impl SoapFault {
    /// Create a new fault.
    pub fn new(
        code: QName,
        string: impl Into<String>,
        actor: Option<String>,
        detail: Option<Detail>,
    ) -> Self {
        Self {
            code,
            string: string.into(),
            actor,
            detail,
        }
    }

    /// The `faultcode` element.
    pub fn fault_code(&self) -> &QName {
        &self.code
    }

    /// The `faultstring` element.
    pub fn fault_string(&self) -> &str {
        &self.string
    }

    /// The `faultactor` element.
    pub fn fault_actor(&self) -> Option<&str> {
        self.actor.as_deref()
    }

    /// The `detail` element.
    pub fn detail(&self) -> Option<&Detail> {
        self.detail.as_ref()
    }
}

/// Fault codes defined by the SOAP envelope specifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardFaultCode {
    /// Envelope namespace not recognized
    VersionMismatch,
    /// A mandatory header block was not understood
    MustUnderstand,
    /// The message was malformed or lacked information (SOAP 1.2: Sender)
    Client,
    /// Processing failed for reasons unrelated to the message (SOAP 1.2: Receiver)
    Server,
}

impl StandardFaultCode {
    /// Local part for the given SOAP version.
    pub fn local_part(&self, version: SoapVersion) -> &'static str {
        match (self, version) {
            (Self::VersionMismatch, _) => "VersionMismatch",
            (Self::MustUnderstand, _) => "MustUnderstand",
            (Self::Client, SoapVersion::Soap11) => "Client",
            (Self::Client, SoapVersion::Soap12) => "Sender",
            (Self::Server, SoapVersion::Soap11) => "Server",
            (Self::Server, SoapVersion::Soap12) => "Receiver",
        }
    }

    /// Qualified name in the envelope namespace of `version`.
    pub fn qname(&self, version: SoapVersion) -> QName {
        QName::new(version.namespace(), self.local_part(version))
    }
}

/// Application-specific fault detail.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Detail {
    entries: Vec<DetailEntry>,
}

/// One child element of a fault detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailEntry {
    /// Element name
    pub name: QName,
    /// Text content
    pub value: String,
}

impl Detail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style variant of [`Detail::add_entry`].
    pub fn with_entry(mut self, name: QName, value: impl Into<String>) -> Self {
        self.add_entry(name, value);
        self
    }

    pub fn add_entry(&mut self, name: QName, value: impl Into<String>) {
        self.entries.push(DetailEntry {
            name,
            value: value.into(),
        });
    }

    pub fn entries(&self) -> &[DetailEntry] {
        &self.entries
    }

    /// First entry with the given name.
    pub fn entry(&self, name: &QName) -> Option<&DetailEntry> {
        self.entries.iter().find(|e| &e.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
