//! letterd — real-time collaborative letter editing core.
//!
//! Multiple clients concurrently edit one logical document per room;
//! opaque deltas are relayed to peers (client-side merge, no OT/CRDT) and
//! the sender's full snapshot is checkpointed last-write-wins. Admin
//! connections additionally receive draft-lifecycle notifications over a
//! standing fan-out channel.

pub mod api;
pub mod auth;
pub mod broadcast;
pub mod config;
pub mod error;
pub mod fanout;
pub mod rooms;
pub mod session;
pub mod state;
pub mod store;
pub mod types;
pub mod ws;
