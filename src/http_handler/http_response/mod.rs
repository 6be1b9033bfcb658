pub mod command_ack;
pub mod command_post;
pub mod global_position_int;
pub mod heartbeat;
pub mod message;
pub mod mission_item_int;
pub mod response_common;
pub mod vfr_hud;
