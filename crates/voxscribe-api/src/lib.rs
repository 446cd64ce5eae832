//! VoxScribe HTTP API
//!
//! Thin transcription backend: clients upload audio over HTTP, the file is
//! relayed to cloud object storage, submitted by URL to the speech
//! recognition vendor, and the finished transcript is folded back onto a
//! flat-file record. Exposed as a library so integration tests can build the
//! router without binding a socket.

pub mod constants;
pub mod error;
pub mod handlers;
pub mod response;
pub mod services;
pub mod setup;
pub mod state;
