use super::response_common::{HTTPResponseType, ResponseError};

/// Response type for the /mavlink endpoint.
///
/// The bridge only confirms that the message was framed and forwarded; the
/// vehicle's verdict arrives separately as a `COMMAND_ACK`.
#[derive(Debug)]
pub(crate) struct CommandPostResponse {}

impl HTTPResponseType for CommandPostResponse {
    type ParsedResponseType = ();

    async fn read_response(
        response: reqwest::Response,
    ) -> Result<Self::ParsedResponseType, ResponseError> {
        Self::unwrap_return_code(response).await?;
        Ok(())
    }
}
