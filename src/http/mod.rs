//! Request pipeline and the transport it runs on

pub mod client;
pub mod request;
pub mod response;
pub mod transport;

pub use client::{ApiClient, ApiClientBuilder};
pub use request::{
    Method, MultipartForm, MultipartPart, OutboundRequest, RequestBody, RequestOptions,
};
pub use response::{http_error, status_message, ApiResponse, Payload, RawResponse};
pub use transport::{ReqwestTransport, Transport, TransportError};
