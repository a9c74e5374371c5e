//! Pluggable sink for client diagnostics
//!
//! Events only carry metadata about a call: key names, byte lengths, whether a context was
//! supplied and the HTTP status. Plaintext, context bytes, ciphertext and the token never
//! reach a sink.

use tracing::{debug, warn};

use crate::transport::Method;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitEvent<'a> {
    EncryptRequested {
        key: &'a str,
        plaintext_len: usize,
        has_context: bool,
    },
    DecryptRequested {
        key: &'a str,
        ciphertext_len: usize,
        has_context: bool,
    },
    RequestSent {
        method: Method,
        path: &'a str,
        body_len: usize,
    },
    ResponseReceived {
        status: u16,
        body_len: usize,
    },
    ServiceFailed {
        status: u16,
        reason: &'a str,
    },
    TransportFailed {
        error: String,
    },
}

pub trait DiagnosticSink: Send + Sync {
    fn record(&self, event: &TransitEvent<'_>);
}

/// Forwards every event to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&self, event: &TransitEvent<'_>) {
        match event {
            TransitEvent::EncryptRequested {
                key,
                plaintext_len,
                has_context,
            } => debug!(key, plaintext_len, has_context, "encrypting"),
            TransitEvent::DecryptRequested {
                key,
                ciphertext_len,
                has_context,
            } => debug!(key, ciphertext_len, has_context, "decrypting"),
            TransitEvent::RequestSent {
                method,
                path,
                body_len,
            } => debug!(method = method.as_str(), path, body_len, "sending transit request"),
            TransitEvent::ResponseReceived { status, body_len } => {
                debug!(status, body_len, "received transit response")
            }
            TransitEvent::ServiceFailed { status, reason } => {
                warn!(status, reason, "transit service returned an error")
            }
            TransitEvent::TransportFailed { error } => {
                warn!(error = %error, "transit request failed before a response")
            }
        }
    }
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn record(&self, _event: &TransitEvent<'_>) {}
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::{Arc, Mutex};

    use super::{DiagnosticSink, TransitEvent};

    /// Keeps the `Debug` rendering of every event it sees
    #[derive(Default, Clone)]
    pub(crate) struct RecordingSink {
        events: Arc<Mutex<Vec<String>>>,
    }

    impl RecordingSink {
        pub(crate) fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    impl DiagnosticSink for RecordingSink {
        fn record(&self, event: &TransitEvent<'_>) {
            self.events.lock().unwrap().push(format!("{:?}", event));
        }
    }
}
