use super::http_request::request_common::RequestError;
use super::http_response::response_common::ResponseError;
use strum_macros::Display;

#[derive(Debug, Display, Clone)]
pub enum HTTPError {
    HTTPRequestError(RequestError),
    HTTPResponseError(ResponseError),
}

impl HTTPError {
    /// Whether the error means that the bridge itself could not be reached,
    /// as opposed to the bridge answering with an error.
    pub fn is_link_down(&self) -> bool {
        matches!(
            self,
            HTTPError::HTTPRequestError(RequestError::NoConnection | RequestError::Timeout)
                | HTTPError::HTTPResponseError(ResponseError::NoConnection)
        )
    }

    /// Whether the bridge has simply not seen the requested message yet.
    pub fn is_not_found(&self) -> bool {
        matches!(self, HTTPError::HTTPResponseError(ResponseError::NotFound))
    }
}

impl std::error::Error for HTTPError {}

impl From<RequestError> for HTTPError {
    fn from(value: RequestError) -> Self { HTTPError::HTTPRequestError(value) }
}

impl From<ResponseError> for HTTPError {
    fn from(value: ResponseError) -> Self { HTTPError::HTTPResponseError(value) }
}
