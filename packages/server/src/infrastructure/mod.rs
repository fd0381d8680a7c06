//! Infrastructure layer: WebSocket delivery and wire DTOs.

pub mod dto;
pub mod message_pusher;
