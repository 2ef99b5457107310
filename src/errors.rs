use crate::forms::FormMode;

pub type FormResult<T> = Result<T, FormError>;

/// Client-side failures. None of these ever reach a directory service.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum FormError {
    #[error("password and confirmation do not match")]
    PasswordMismatch,
    #[error("refusing to delete the currently logged in user")]
    SelfPreservation,
    #[error("invalid circle size: {0:?}")]
    InvalidCircleSize(String),
    #[error("unknown user role: {0}")]
    UnknownRole(String),
    #[error("unknown form field: {0}")]
    UnknownField(String),
    #[error("invalid flag value (expected true or false): {0}")]
    InvalidFlag(String),
    #[error("form is {actual}, but this action requires it to be {expected}")]
    WrongMode { expected: FormMode, actual: FormMode },
}

impl FormError {
    // the message shown to the user for this error is looked up under this key
    pub fn i18n_key(&self) -> &'static str {
        match self {
            Self::PasswordMismatch => "user.password.mismatch",
            Self::SelfPreservation => "delete.self",
            Self::InvalidCircleSize(..) => "invalid.number",
            Self::UnknownRole(..) => "error.unknown.role",
            Self::UnknownField(..) => "error.unknown.field",
            Self::InvalidFlag(..) => "error.invalid.flag",
            Self::WrongMode { .. } => "error.wrong.mode",
        }
    }
}

/// Failure reported by a directory service; the message is shown verbatim.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct RemoteError {
    pub message: String,
}

impl RemoteError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
