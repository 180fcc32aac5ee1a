//! Error types for SOAP message handling.

use crate::fault::SoapFault;
use thiserror::Error;

/// Errors surfaced by message contexts and handler chains.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HandlerError {
    #[error("Operation not supported: {0}")]
    UnsupportedOperation(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Invalid property: {0}")]
    InvalidProperty(String),

    #[error("SOAP fault {code}: {text}", code = .0.fault_code(), text = .0.fault_string())]
    Fault(#[from] SoapFault),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl HandlerError {
    /// Get the string code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnsupportedOperation(_) => "UNSUPPORTED_OPERATION",
            Self::InvalidPayload(_) => "INVALID_PAYLOAD",
            Self::InvalidProperty(_) => "INVALID_PROPERTY",
            Self::Fault(_) => "SOAP_FAULT",
            Self::Config(_) => "CONFIG",
        }
    }

    /// The carried fault, if this is a SOAP-level error.
    pub fn as_fault(&self) -> Option<&SoapFault> {
        match self {
            Self::Fault(fault) => Some(fault),
            _ => None,
        }
    }

    /// Consume into the carried fault.
    pub fn into_fault(self) -> Result<SoapFault, Self> {
        match self {
            Self::Fault(fault) => Ok(fault),
            other => Err(other),
        }
    }
}
