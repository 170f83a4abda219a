//! Host side of the courier console.
//!
//! # Overview
//! `courier-core` only describes requests; this crate executes them with
//! ureq and feeds the results back into the core's parsers and into the
//! `QuoteWorkflow`.

pub mod logging;
pub mod transport;

use courier_core::{Outbound, QuoteWorkflow};
use tracing::warn;

pub use transport::{Transport, UreqTransport};

/// Execute `outbound` and every follow-up call the workflow asks for.
pub fn drive(transport: &impl Transport, workflow: &mut QuoteWorkflow, outbound: Outbound) {
    let mut next = Some(outbound);
    while let Some(Outbound { call, request }) = next.take() {
        let result = transport.execute(&request);
        if let Err(err) = &result {
            warn!(error = %err, path = %request.path, "transport failure");
        }
        next = workflow.on_response(call, result);
    }
}

/// Drive an optional call; a `None` from the workflow means nothing to send.
pub fn drive_opt(transport: &impl Transport, workflow: &mut QuoteWorkflow, outbound: Option<Outbound>) {
    if let Some(outbound) = outbound {
        drive(transport, workflow, outbound);
    }
}
