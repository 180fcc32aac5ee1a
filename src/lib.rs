//! SOAP message context and fault contracts for Zentinel handler chains.
//!
//! Handlers inspect and replace the in-flight SOAP message through
//! [`SoapMessageContext`] and abort processing by returning a [`SoapFault`].
//!
//! # Features
//!
//! - Message context with read-only phases and actor roles fixed per pass
//! - Immutable SOAP fault values (code, string, actor, detail)
//! - Envelope identification (version, header blocks, body element)
//! - Sequential handler chain with fault interception
//! - mustUnderstand header processing
//!
//! # Example
//!
//! ```ignore
//! use zentinel_soap_handler::{HandlerChain, HandlerChainConfig, SoapMessageContext};
//!
//! let chain = HandlerChain::from_config(&HandlerChainConfig::default());
//! let mut ctx = chain.new_context();
//! ctx.set_payload(envelope_bytes)?;
//! chain.process_request(&mut ctx)?;
//! ```

pub mod chain;
pub mod config;
pub mod context;
pub mod error;
pub mod fault;
pub mod message;
pub mod must_understand;
pub mod parser;
pub mod qname;

pub use chain::{FaultDisposition, Handler, HandlerChain};
pub use config::{HandlerChainConfig, ProcessingPhase, SoapVersion};
pub use context::{HandlerContext, MessageContext, SoapMessageContext};
pub use error::HandlerError;
pub use fault::{Detail, SoapFault, StandardFaultCode};
pub use message::{Attachment, HeaderBlock, IntoSoapMessage, SoapMessage};
pub use qname::QName;
