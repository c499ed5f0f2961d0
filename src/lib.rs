//! Implementation of the [Source RCON](https://developer.valvesoftware.com/wiki/Source_RCON_Protocol)
//! protocol, used to remotely administer game servers over a single TCP connection.
//!
//! The crate is split in two layers:
//! * [`packet`] - pure encode/decode of the RCON frame format.
//! * [`Session`] - an authenticated connection that runs one write-then-read
//!   transaction at a time.
//!
//! # Examples
//!
//! ```no_run
//! use source_rcon::RconError;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), RconError> {
//!     let session = source_rcon::open("localhost", 27015, "password").await?;
//!
//!     let output = session.command("status").await?;
//!     println!("{output}");
//!
//!     session.disconnect().await
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]

pub mod errors;
pub mod packet;
mod session;
mod socket;

pub use errors::{RconError, RconProtocolError};
pub use packet::{RconPacketType, Response};
pub use session::{is_usable, open, open_with_timeout, Session};

/// Request type for executing a console command.
///
/// Servers reuse this value as the type of their authentication response.
pub const SERVERDATA_EXECCOMMAND: i32 = 2;

/// Request type for authenticating with the RCON password.
pub const SERVERDATA_AUTH: i32 = 3;

/// Response type carrying command output.
pub const SERVERDATA_RESPONSE_VALUE: i32 = 0;

/// Request id echoed by the server when it rejects the password.
pub const AUTH_FAILURE_ID: i32 = -1;

/// Size of the buffer used for the single read of each transaction.
///
/// Responses larger than this (or split across TCP segments) are not reassembled.
pub const RECEIVE_BUFFER_SIZE: usize = 4096;

/// Bytes a frame adds around its payload: length, request id, type and terminator.
pub const PACKET_OVERHEAD: usize = 14;
