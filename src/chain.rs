//! Sequential handler chain.
//!
//! Handlers run in registration order against one [`HandlerContext`] per
//! exchange. A [`SoapFault`] raised by a handler is offered to the handlers
//! that already ran, last first, and then returned to the caller.

use crate::config::{HandlerChainConfig, ProcessingPhase};
use crate::context::{HandlerContext, MessagePolicy, SoapMessageContext};
use crate::error::HandlerError;
use crate::fault::SoapFault;
use crate::must_understand::MustUnderstandHandler;
use tracing::{debug, info, warn};

/// What a fault handler decided to do with a fault.
#[derive(Debug, Clone, PartialEq)]
pub enum FaultDisposition {
    /// Pass the fault on unchanged
    Rethrow,
    /// Replace the fault with another one
    Translate(SoapFault),
    /// Stop fault processing; only honored when the chain permits it
    Suppress,
}

/// A processing step in a handler chain.
pub trait Handler: Send + Sync {
    fn name(&self) -> &str;

    fn handle_request(&self, _ctx: &mut dyn SoapMessageContext) -> Result<(), HandlerError> {
        Ok(())
    }

    fn handle_response(&self, _ctx: &mut dyn SoapMessageContext) -> Result<(), HandlerError> {
        Ok(())
    }

    fn handle_fault(&self, _ctx: &mut dyn SoapMessageContext, _fault: &SoapFault) -> FaultDisposition {
        FaultDisposition::Rethrow
    }
}

/// Ordered handlers sharing one set of actor roles.
pub struct HandlerChain {
    handlers: Vec<Box<dyn Handler>>,
    roles: Vec<String>,
    policy: MessagePolicy,
    allow_fault_suppression: bool,
}

impl HandlerChain {
    /// Create an empty chain.
    pub fn new(config: &HandlerChainConfig) -> Self {
        Self {
            handlers: Vec::new(),
            roles: config.roles.clone(),
            policy: MessagePolicy::from(&config.settings),
            allow_fault_suppression: config.settings.allow_fault_suppression,
        }
    }

    /// Create a chain with the built-in handlers the config enables.
    pub fn from_config(config: &HandlerChainConfig) -> Self {
        let mut chain = Self::new(config);
        if config.must_understand.enabled {
            chain.add_handler(MustUnderstandHandler::new(
                config.must_understand.understood_headers.clone(),
            ));
        }
        info!(
            roles = ?chain.roles,
            handlers = chain.handlers.len(),
            "Handler chain configured"
        );
        chain
    }

    /// Append a handler.
    pub fn add_handler(&mut self, handler: impl Handler + 'static) {
        self.handlers.push(Box::new(handler));
    }

    pub fn with_handler(mut self, handler: impl Handler + 'static) -> Self {
        self.add_handler(handler);
        self
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// A fresh context for one exchange, carrying this chain's roles.
    pub fn new_context(&self) -> HandlerContext {
        HandlerContext::new(self.roles.clone(), self.policy.clone())
    }

    /// Run the request pass.
    pub fn process_request(&self, ctx: &mut HandlerContext) -> Result<(), HandlerError> {
        self.process(ctx, ProcessingPhase::Request)
    }

    /// Run the response pass.
    pub fn process_response(&self, ctx: &mut HandlerContext) -> Result<(), HandlerError> {
        self.process(ctx, ProcessingPhase::Response)
    }

    fn process(&self, ctx: &mut HandlerContext, phase: ProcessingPhase) -> Result<(), HandlerError> {
        ctx.set_phase(phase);

        for (index, handler) in self.handlers.iter().enumerate() {
            debug!(handler = handler.name(), phase = phase.as_str(), "Invoking handler");

            let result = match phase {
                ProcessingPhase::Response => handler.handle_response(ctx),
                _ => handler.handle_request(ctx),
            };

            match result {
                Ok(()) => {}
                Err(HandlerError::Fault(fault)) => {
                    warn!(
                        handler = handler.name(),
                        phase = phase.as_str(),
                        fault_code = %fault.fault_code(),
                        fault_string = fault.fault_string(),
                        "Handler raised SOAP fault"
                    );
                    return self.dispatch_fault(ctx, fault, index);
                }
                Err(e) => {
                    warn!(
                        handler = handler.name(),
                        phase = phase.as_str(),
                        code = e.code(),
                        error = %e,
                        "Handler failed"
                    );
                    return Err(e);
                }
            }
        }

        Ok(())
    }

    /// Offer `fault` to handlers `0..=raised_at`, last first.
    fn dispatch_fault(
        &self,
        ctx: &mut HandlerContext,
        fault: SoapFault,
        raised_at: usize,
    ) -> Result<(), HandlerError> {
        ctx.set_phase(ProcessingPhase::Fault);
        let mut fault = fault;

        for handler in self.handlers[..=raised_at].iter().rev() {
            match handler.handle_fault(ctx, &fault) {
                FaultDisposition::Rethrow => {}
                FaultDisposition::Translate(translated) => {
                    debug!(
                        handler = handler.name(),
                        from = %fault.fault_code(),
                        to = %translated.fault_code(),
                        "Fault translated"
                    );
                    fault = translated;
                }
                FaultDisposition::Suppress if self.allow_fault_suppression => {
                    info!(
                        handler = handler.name(),
                        fault_code = %fault.fault_code(),
                        "Fault suppressed"
                    );
                    return Ok(());
                }
                FaultDisposition::Suppress => {
                    warn!(
                        handler = handler.name(),
                        fault_code = %fault.fault_code(),
                        "Fault suppression not permitted, rethrowing"
                    );
                }
            }
        }

        Err(HandlerError::Fault(fault))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::MessageContext;
    use crate::qname::QName;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn server_fault(text: &str) -> SoapFault {
        SoapFault::new(
            QName::new("http://example.org", "Server"),
            text,
            Some("urn:node1".to_string()),
            None,
        )
    }

    fn config() -> HandlerChainConfig {
        HandlerChainConfig {
            roles: vec!["urn:node1".to_string()],
            ..Default::default()
        }
    }

    struct Recorder {
        name: String,
        log: Arc<std::sync::Mutex<Vec<String>>>,
    }

    impl Handler for Recorder {
        fn name(&self) -> &str {
            &self.name
        }

        fn handle_request(&self, _ctx: &mut dyn SoapMessageContext) -> Result<(), HandlerError> {
            self.log.lock().unwrap().push(format!("request:{}", self.name));
            Ok(())
        }

        fn handle_response(&self, _ctx: &mut dyn SoapMessageContext) -> Result<(), HandlerError> {
            self.log.lock().unwrap().push(format!("response:{}", self.name));
            Ok(())
        }

        fn handle_fault(&self, _ctx: &mut dyn SoapMessageContext, _fault: &SoapFault) -> FaultDisposition {
            self.log.lock().unwrap().push(format!("fault:{}", self.name));
            FaultDisposition::Rethrow
        }
    }

    struct Raiser(SoapFault);

    impl Handler for Raiser {
        fn name(&self) -> &str {
            "raiser"
        }

        fn handle_request(&self, _ctx: &mut dyn SoapMessageContext) -> Result<(), HandlerError> {
            Err(self.0.clone().into())
        }
    }

    struct Interceptor(FaultDisposition);

    impl Handler for Interceptor {
        fn name(&self) -> &str {
            "interceptor"
        }

        fn handle_fault(&self, _ctx: &mut dyn SoapMessageContext, _fault: &SoapFault) -> FaultDisposition {
            self.0.clone()
        }
    }

    struct Counter(Arc<AtomicUsize>);

    impl Handler for Counter {
        fn name(&self) -> &str {
            "counter"
        }

        fn handle_request(&self, _ctx: &mut dyn SoapMessageContext) -> Result<(), HandlerError> {
            self.0.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }
    }

    fn recorder(name: &str, log: &Arc<std::sync::Mutex<Vec<String>>>) -> Recorder {
        Recorder {
            name: name.to_string(),
            log: Arc::clone(log),
        }
    }

    #[test]
    fn test_handlers_run_in_order() {
        let log = Arc::new(std::sync::Mutex::new(Vec::new()));
        let chain = HandlerChain::new(&config())
            .with_handler(recorder("a", &log))
            .with_handler(recorder("b", &log));

        let mut ctx = chain.new_context();
        chain.process_request(&mut ctx).unwrap();
        chain.process_response(&mut ctx).unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["request:a", "request:b", "response:a", "response:b"]
        );
        assert_eq!(ctx.phase(), ProcessingPhase::Response);
    }

    #[test]
    fn test_fault_propagates_unmodified() {
        let fault = server_fault("internal error");
        let counter = Arc::new(AtomicUsize::new(0));
        let chain = HandlerChain::new(&config())
            .with_handler(Raiser(fault.clone()))
            .with_handler(Counter(Arc::clone(&counter)));

        let mut ctx = chain.new_context();
        let err = chain.process_request(&mut ctx).unwrap_err();

        assert_eq!(err, HandlerError::Fault(fault));
        assert_eq!(counter.load(Ordering::Relaxed), 0);
        assert_eq!(ctx.phase(), ProcessingPhase::Fault);
    }

    #[test]
    fn test_fault_offered_to_earlier_handlers_in_reverse() {
        let log = Arc::new(std::sync::Mutex::new(Vec::new()));
        let chain = HandlerChain::new(&config())
            .with_handler(recorder("a", &log))
            .with_handler(recorder("b", &log))
            .with_handler(Raiser(server_fault("boom")))
            .with_handler(recorder("c", &log));

        let mut ctx = chain.new_context();
        assert!(chain.process_request(&mut ctx).is_err());

        assert_eq!(
            *log.lock().unwrap(),
            vec!["request:a", "request:b", "fault:b", "fault:a"]
        );
    }

    #[test]
    fn test_fault_translation() {
        let translated = SoapFault::new(QName::local("Client"), "rejected", None, None);
        let chain = HandlerChain::new(&config())
            .with_handler(Interceptor(FaultDisposition::Translate(translated.clone())))
            .with_handler(Raiser(server_fault("boom")));

        let mut ctx = chain.new_context();
        let err = chain.process_request(&mut ctx).unwrap_err();
        assert_eq!(err.as_fault(), Some(&translated));
    }

    #[test]
    fn test_suppression_requires_permission() {
        let chain = HandlerChain::new(&config())
            .with_handler(Interceptor(FaultDisposition::Suppress))
            .with_handler(Raiser(server_fault("boom")));
        let mut ctx = chain.new_context();
        assert!(chain.process_request(&mut ctx).unwrap_err().as_fault().is_some());

        let mut permissive = config();
        permissive.settings.allow_fault_suppression = true;
        let chain = HandlerChain::new(&permissive)
            .with_handler(Interceptor(FaultDisposition::Suppress))
            .with_handler(Raiser(server_fault("boom")));
        let mut ctx = chain.new_context();
        assert!(chain.process_request(&mut ctx).is_ok());
    }

    #[test]
    fn test_non_fault_error_skips_fault_handlers() {
        struct ReadOnlyWriter;

        impl Handler for ReadOnlyWriter {
            fn name(&self) -> &str {
                "writer"
            }

            fn handle_response(&self, ctx: &mut dyn SoapMessageContext) -> Result<(), HandlerError> {
                let message = ctx
                    .message()
                    .cloned()
                    .ok_or_else(|| HandlerError::InvalidPayload("no message".to_string()))?;
                ctx.set_message(message)
            }
        }

        let log = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut cfg = config();
        cfg.settings.read_only_phases = vec![ProcessingPhase::Response];
        let chain = HandlerChain::new(&cfg)
            .with_handler(recorder("a", &log))
            .with_handler(ReadOnlyWriter);

        let mut ctx = chain.new_context();
        ctx.set_payload(
            r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"><soap:Body/></soap:Envelope>"#,
        )
        .unwrap();

        let err = chain.process_response(&mut ctx).unwrap_err();
        assert!(matches!(err, HandlerError::UnsupportedOperation(_)));
        assert_eq!(*log.lock().unwrap(), vec!["response:a"]);
    }

    #[test]
    fn test_roles_seen_by_every_handler() {
        struct RoleProbe(Arc<std::sync::Mutex<Vec<Vec<String>>>>);

        impl Handler for RoleProbe {
            fn name(&self) -> &str {
                "probe"
            }

            fn handle_request(&self, ctx: &mut dyn SoapMessageContext) -> Result<(), HandlerError> {
                self.0.lock().unwrap().push(ctx.roles().to_vec());
                ctx.set_property("probe.seen", json!(true))
            }
        }

        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let chain = HandlerChain::new(&config())
            .with_handler(RoleProbe(Arc::clone(&seen)))
            .with_handler(RoleProbe(Arc::clone(&seen)));

        let mut ctx = chain.new_context();
        chain.process_request(&mut ctx).unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen.iter().all(|roles| roles == chain.roles()));
        assert!(ctx.contains_property("probe.seen"));
    }

    #[test]
    fn test_from_config_installs_must_understand() {
        assert_eq!(HandlerChain::from_config(&config()).len(), 1);

        let mut cfg = config();
        cfg.must_understand.enabled = false;
        assert!(HandlerChain::from_config(&cfg).is_empty());
    }
}
