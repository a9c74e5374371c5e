mod client_options;
mod diagnostics;
mod errors;
pub mod payload;
mod transit_client;
mod transit_encrypts;
mod transport;

pub use crate::client_options::{ClientOptions, ADDR_ENV, TOKEN_ENV};
pub use crate::diagnostics::{DiagnosticSink, NullSink, TracingSink, TransitEvent};
pub use crate::errors::{TransitError, TransportError};
pub use crate::transit_client::{TransitClient, TOKEN_HEADER};
pub use crate::transit_encrypts::TransitEncrypts;
pub use crate::transport::{HttpTransport, Method, Transport, TransportRequest, TransportResponse};
