//! Message contexts handed to handlers.
//!
//! [`MessageContext`] is the property bag shared by every binding;
//! [`SoapMessageContext`] adds access to the SOAP message and the actor roles
//! of the current pass. [`HandlerContext`] is the implementation used by
//! [`HandlerChain`](crate::chain::HandlerChain).

use crate::config::{ProcessingPhase, SettingsConfig, SoapVersion};
use crate::error::HandlerError;
use crate::message::{IntoSoapMessage, SoapMessage};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// Named properties shared between handlers of one exchange.
pub trait MessageContext {
    /// Set a property, replacing any previous value.
    fn set_property(&mut self, name: &str, value: Value) -> Result<(), HandlerError>;

    fn property(&self, name: &str) -> Option<&Value>;

    /// Remove a property, returning its value.
    fn remove_property(&mut self, name: &str) -> Option<Value>;

    fn contains_property(&self, name: &str) -> bool {
        self.property(name).is_some()
    }

    /// Names of all properties, sorted.
    fn property_names(&self) -> Vec<String>;
}

/// Access to the SOAP message of a request or response.
pub trait SoapMessageContext: MessageContext {
    /// The current message, `None` if none has been set.
    fn message(&self) -> Option<&SoapMessage>;

    /// Replace the current message.
    ///
    /// Fails with `UnsupportedOperation` when the context does not allow
    /// mutation in its current phase, and with `InvalidPayload` when the
    /// message cannot be held by this context. The prior message is kept on
    /// failure.
    fn set_message(&mut self, message: SoapMessage) -> Result<(), HandlerError>;

    /// Actor role URIs for this pass; invariant while the pass runs.
    fn roles(&self) -> &[String];

    /// Adapt `payload` and set it as the message.
    fn set_payload<P: IntoSoapMessage>(&mut self, payload: P) -> Result<(), HandlerError>
    where
        Self: Sized,
    {
        self.set_message(payload.into_soap_message()?)
    }
}

/// Restrictions a [`HandlerContext`] places on the messages it holds.
#[derive(Debug, Clone)]
pub struct MessagePolicy {
    pub allowed_versions: Vec<SoapVersion>,
    pub max_message_size: usize,
    pub read_only_phases: Vec<ProcessingPhase>,
}

impl Default for MessagePolicy {
    fn default() -> Self {
        Self::from(&SettingsConfig::default())
    }
}

impl From<&SettingsConfig> for MessagePolicy {
    fn from(settings: &SettingsConfig) -> Self {
        Self {
            allowed_versions: settings.allowed_versions.clone(),
            max_message_size: settings.max_message_size,
            read_only_phases: settings.read_only_phases.clone(),
        }
    }
}

/// Context for one message exchange.
///
/// Owned by a single exchange at a time; not meant to be shared between
/// exchanges processed concurrently.
#[derive(Debug, Clone)]
pub struct HandlerContext {
    message: Option<SoapMessage>,
    roles: Vec<String>,
    phase: ProcessingPhase,
    policy: MessagePolicy,
    properties: HashMap<String, Value>,
}

impl HandlerContext {
    /// Create an empty context acting in `roles`.
    pub fn new(roles: Vec<String>, policy: MessagePolicy) -> Self {
        Self {
            message: None,
            roles,
            phase: ProcessingPhase::Request,
            policy,
            properties: HashMap::new(),
        }
    }

    pub fn phase(&self) -> ProcessingPhase {
        self.phase
    }

    pub(crate) fn set_phase(&mut self, phase: ProcessingPhase) {
        self.phase = phase;
    }

    /// Whether `set_message` is allowed in the current phase.
    pub fn is_mutable(&self) -> bool {
        !self.policy.read_only_phases.contains(&self.phase)
    }
}

impl MessageContext for HandlerContext {
    fn set_property(&mut self, name: &str, value: Value) -> Result<(), HandlerError> {
        if name.trim().is_empty() {
            return Err(HandlerError::InvalidProperty(
                "property name must not be empty".to_string(),
            ));
        }
        self.properties.insert(name.to_string(), value);
        Ok(())
    }

    fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    fn remove_property(&mut self, name: &str) -> Option<Value> {
        self.properties.remove(name)
    }

    fn property_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.properties.keys().cloned().collect();
        names.sort();
        names
    }
}

impl SoapMessageContext for HandlerContext {
    fn message(&self) -> Option<&SoapMessage> {
        self.message.as_ref()
    }

    fn set_message(&mut self, message: SoapMessage) -> Result<(), HandlerError> {
        if !self.is_mutable() {
            return Err(HandlerError::UnsupportedOperation(format!(
                "message is read-only in the {} phase",
                self.phase.as_str()
            )));
        }

        if !self.policy.allowed_versions.contains(&message.version()) {
            return Err(HandlerError::InvalidPayload(format!(
                "SOAP version {:?} not allowed, allowed versions: {:?}",
                message.version(),
                self.policy.allowed_versions
            )));
        }

        let size = message.size();
        if size > self.policy.max_message_size {
            return Err(HandlerError::InvalidPayload(format!(
                "message size {} exceeds maximum {}",
                size, self.policy.max_message_size
            )));
        }

        debug!(
            phase = self.phase.as_str(),
            version = ?message.version(),
            body = ?message.body_element().map(ToString::to_string),
            "Message replaced"
        );
        self.message = Some(message);
        Ok(())
    }

    fn roles(&self) -> &[String] {
        &self.roles
    }
}
