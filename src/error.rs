//! Error taxonomy for the connection-handling engine.
//!
//! Mirrors the five-way split in the design: transport failures, malformed
//! instructions, nonzero returns from a backend driver, handoff failures,
//! and resource exhaustion (the last of which Rust turns into a process
//! abort rather than a value, so it has no variant here).

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A read, write, or poll on the underlying socket failed.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// The byte stream did not conform to the display protocol grammar.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A backend driver handler returned a fatal (nonzero) result.
    #[error("backend driver error in {handler}: {source}")]
    Backend {
        handler: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A `resume` handshake named a UUID with no live connection.
    #[error("resume requested unknown connection {0}")]
    UnknownConnection(uuid::Uuid),

    /// No backend driver is registered under the requested name.
    #[error("no backend driver registered as {0:?}")]
    UnknownDriver(String),
}

impl Error {
    pub fn protocol<S: Into<String>>(message: S) -> Self {
        Error::Protocol(message.into())
    }

    pub fn backend(handler: &'static str, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Error::Backend {
            handler,
            source: Box::new(source),
        }
    }
}
