//! # chat-gateway
//!
//! WebSocket gateway for the webchat lobby: clients claim an identity with
//! `init_user`, broadcast with `msg_all`, and everyone connected is told when an
//! identity comes online or goes offline.

pub mod broadcast;
pub mod connection;
pub mod handlers;
pub mod protocol;
pub mod server;

pub use server::{create_app, create_directory, create_gateway_state, run, GatewayState};
