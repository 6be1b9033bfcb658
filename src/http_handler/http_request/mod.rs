use super::http_response::{command_post, message};

pub mod command_long_post;
pub mod message_get;
pub mod request_common;
