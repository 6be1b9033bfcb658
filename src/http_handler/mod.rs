pub mod common;
pub mod http_client;
pub mod http_request;
pub mod http_response;

pub use common::HTTPError;
