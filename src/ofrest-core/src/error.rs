use std::fmt;

/// Failure kinds the REST API plugin can report.
///
/// The set is closed: tags the server sends that are not listed in
/// [`ErrorKind::from_tag`] surface as [`ErrorKind::InvalidResponse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    IllegalArgument,
    UserNotFound,
    GroupNotFound,
    RoomNotFound,
    UserAlreadyExists,
    GroupAlreadyExists,
    AlreadyExists,
    NotAuthorised,
    UserServiceDisabled,
    SharedGroup,
    PropertyNotFound,
    NotAllowed,
    InvalidResponse,
}

impl ErrorKind {
    /// Map the `exception` tag of an error body onto a kind.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let kind = match tag {
            "IllegalArgumentException" => Self::IllegalArgument,
            "UserNotFoundException" => Self::UserNotFound,
            "GroupNotFoundException" => Self::GroupNotFound,
            "RoomNotFoundException" => Self::RoomNotFound,
            "UserAlreadyExistsException" => Self::UserAlreadyExists,
            "GroupAlreadyExistsException" => Self::GroupAlreadyExists,
            "AlreadyExistsException" => Self::AlreadyExists,
            "RequestNotAuthorised" => Self::NotAuthorised,
            "UserServiceDisabled" => Self::UserServiceDisabled,
            "SharedGroupException" => Self::SharedGroup,
            "PropertyNotFoundException" => Self::PropertyNotFound,
            "NotAllowedException" => Self::NotAllowed,
            _ => return None,
        };
        Some(kind)
    }

    pub fn is_not_found(self) -> bool {
        matches!(
            self,
            Self::UserNotFound | Self::GroupNotFound | Self::RoomNotFound | Self::PropertyNotFound
        )
    }

    pub fn is_already_exists(self) -> bool {
        matches!(
            self,
            Self::UserAlreadyExists | Self::GroupAlreadyExists | Self::AlreadyExists
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::IllegalArgument => "illegal argument",
            Self::UserNotFound => "user not found",
            Self::GroupNotFound => "group not found",
            Self::RoomNotFound => "room not found",
            Self::UserAlreadyExists => "user already exists",
            Self::GroupAlreadyExists => "group already exists",
            Self::AlreadyExists => "already exists",
            Self::NotAuthorised => "request not authorised",
            Self::UserServiceDisabled => "user service disabled",
            Self::SharedGroup => "shared group conflict",
            Self::PropertyNotFound => "property not found",
            Self::NotAllowed => "not allowed",
            Self::InvalidResponse => "invalid response",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application-level failure reported by (or about) the server.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("{kind}: {message}")]
    Server { kind: ErrorKind, message: String },

    #[error("invalid response with status code: {status}")]
    InvalidStatus { status: u16 },

    #[error("unknown exception: {} (status {status})", .tag.as_deref().unwrap_or("<missing>"))]
    UnknownException { status: u16, tag: Option<String> },
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Server { kind, .. } => *kind,
            Self::InvalidStatus { .. } | Self::UnknownException { .. } => ErrorKind::InvalidResponse,
        }
    }

    /// Server-supplied message, if the failure carried one.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Server { message, .. } => Some(message),
            _ => None,
        }
    }
}
