//! Realtime presence and session coordination for Tsudoi.
//!
//! Tracks who is online, who sits in which voice channel, who is typing where,
//! and relays chat events between the connections subscribed to a channel.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
