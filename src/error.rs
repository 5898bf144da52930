//! Error type shared by every device abstraction in the crate.

use derive_more::{Display, Error};

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors surfaced by the matrix engine.
#[derive(Debug, Display, Error)]
pub enum Error {
    /// The physical LED strip rejected a frame.
    #[display("LED strip write failed")]
    StripWrite,

    /// The power button input could not be read.
    #[display("power button input could not be read")]
    InputPin,

    /// A pixel update body was not valid JSON of the expected shape.
    #[display("malformed pixel update request: {_0}")]
    MalformedRequest(#[error(not(source))] serde_json_core::de::Error),

    /// A pixel update body was longer than the transport buffer.
    #[display("pixel update body longer than {_0} bytes")]
    BodyTooLarge(#[error(not(source))] usize),

    /// The published network address does not fit the address buffer.
    #[display("network address longer than {_0} bytes")]
    AddressTooLong(#[error(not(source))] usize),

    /// The network link was already published for this boot.
    #[display("network link already published")]
    LinkAlreadyPublished,

    /// An embassy task could not be spawned.
    #[cfg(feature = "arm")]
    #[display("task spawn failed")]
    TaskSpawn(#[error(not(source))] embassy_executor::SpawnError),
}
