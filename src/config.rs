//! Configuration types for the SOAP handler chain.

use crate::error::HandlerError;
use crate::qname::QName;
use serde::{Deserialize, Serialize};

/// SOAP 1.1 envelope namespace.
pub const SOAP_11_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
/// SOAP 1.2 envelope namespace.
pub const SOAP_12_NS: &str = "http://www.w3.org/2003/05/soap-envelope";

/// Main configuration for a handler chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HandlerChainConfig {
    /// Config version
    pub version: String,

    /// Actor/role URIs this node acts as, in order
    pub roles: Vec<String>,

    /// General settings
    pub settings: SettingsConfig,

    /// mustUnderstand header processing
    pub must_understand: MustUnderstandConfig,
}

impl Default for HandlerChainConfig {
    fn default() -> Self {
        Self {
            version: "1".to_string(),
            roles: Vec::new(),
            settings: SettingsConfig::default(),
            must_understand: MustUnderstandConfig::default(),
        }
    }
}

impl HandlerChainConfig {
    /// Parse a YAML document.
    pub fn from_yaml(content: &str) -> Result<Self, HandlerError> {
        serde_yaml::from_str(content).map_err(|e| HandlerError::Config(e.to_string()))
    }
}

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsConfig {
    /// SOAP versions a context accepts
    pub allowed_versions: Vec<SoapVersion>,

    /// Maximum message size a context accepts, envelope plus attachments (bytes)
    pub max_message_size: usize,

    /// Phases in which the message may not be replaced
    pub read_only_phases: Vec<ProcessingPhase>,

    /// Honor `FaultDisposition::Suppress` from fault handlers
    pub allow_fault_suppression: bool,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            allowed_versions: vec![SoapVersion::Soap11, SoapVersion::Soap12],
            max_message_size: 1_048_576, // 1MB
            read_only_phases: Vec::new(),
            allow_fault_suppression: false,
        }
    }
}

/// mustUnderstand processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MustUnderstandConfig {
    /// Install the mustUnderstand check at the head of the chain
    pub enabled: bool,

    /// Header blocks this node understands, in `{namespace}local` form
    pub understood_headers: Vec<QName>,
}

impl Default for MustUnderstandConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            understood_headers: Vec::new(),
        }
    }
}

/// SOAP versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoapVersion {
    /// SOAP 1.1 (namespace: http://schemas.xmlsoap.org/soap/envelope/)
    #[serde(rename = "1.1")]
    Soap11,
    /// SOAP 1.2 (namespace: http://www.w3.org/2003/05/soap-envelope)
    #[serde(rename = "1.2")]
    Soap12,
}

impl SoapVersion {
    /// Envelope namespace URI.
    pub fn namespace(&self) -> &'static str {
        match self {
            Self::Soap11 => SOAP_11_NS,
            Self::Soap12 => SOAP_12_NS,
        }
    }

    /// Look up a version by envelope namespace URI.
    pub fn from_namespace(ns: &str) -> Option<Self> {
        match ns {
            SOAP_11_NS => Some(Self::Soap11),
            SOAP_12_NS => Some(Self::Soap12),
            _ => None,
        }
    }
}

/// Processing pass a context is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingPhase {
    #[default]
    Request,
    Response,
    Fault,
}

impl ProcessingPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::Response => "response",
            Self::Fault => "fault",
        }
    }
}
