//! mustUnderstand header processing.

use crate::chain::Handler;
use crate::context::SoapMessageContext;
use crate::error::HandlerError;
use crate::fault::{SoapFault, StandardFaultCode};
use crate::qname::QName;
use tracing::debug;

/// Faults a request carrying a mandatory header block addressed to this
/// node that no handler understands.
pub struct MustUnderstandHandler {
    understood: Vec<QName>,
}

impl MustUnderstandHandler {
    pub fn new(understood: Vec<QName>) -> Self {
        Self { understood }
    }

    pub fn understands(&self, name: &QName) -> bool {
        self.understood.contains(name)
    }
}

impl Handler for MustUnderstandHandler {
    fn name(&self) -> &str {
        "must-understand"
    }

    fn handle_request(&self, ctx: &mut dyn SoapMessageContext) -> Result<(), HandlerError> {
        let Some(message) = ctx.message() else {
            return Ok(());
        };

        let roles = ctx.roles();
        let not_understood = message
            .header_blocks()
            .iter()
            .filter(|block| block.must_understand && block.is_targeted_at(roles))
            .find(|block| !self.understands(&block.name));

        if let Some(block) = not_understood {
            debug!(header = %block.name, actor = ?block.actor, "Mandatory header not understood");
            return Err(SoapFault::new(
                StandardFaultCode::MustUnderstand.qname(message.version()),
                format!("Header block {} was not understood", block.name),
                roles.first().cloned(),
                None,
            )
            .into());
        }

        Ok(())
    }
}
