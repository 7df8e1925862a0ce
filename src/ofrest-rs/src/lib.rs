//! ofrest Client Library
//!
//! Blocking HTTP client for the Openfire REST API plugin.

mod client;
mod groups;
mod messages;
mod muc;
mod security;
mod sessions;
mod system;
mod users;

pub use client::{Client, Query};
pub use reqwest::Method;
pub use groups::Groups;
pub use messages::Messages;
pub use muc::Muc;
pub use security::SecurityAuditLog;
pub use sessions::Sessions;
pub use system::System;
pub use users::Users;

pub use ofrest_core::{
    normalize, normalize_as, ApiError, ClientConfig, ErrorKind, LogQuery, NewUser, Properties,
    Reply, Role, RoomConfig, RoomQuery, RoomType, RosterItem, Shape, Subscription, UserUpdate,
};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Invalid credential header: {0}")]
    InvalidCredential(#[from] reqwest::header::InvalidHeaderValue),
}

impl ClientError {
    /// Kind of a server-side failure; `None` for transport and setup errors.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            ClientError::Api(e) => Some(e.kind()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind().is_some_and(ErrorKind::is_not_found)
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
