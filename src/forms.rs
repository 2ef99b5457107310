use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    errors::{FormError, FormResult},
    validation::{CIRCLE_SIZE_MAX, NOTE_MAX_CHARS},
};

pub mod map;
pub mod user;

/// Which surface of a form is showing. The edit dialog and its delete
/// confirmation are never open together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormMode {
    Editing,
    ConfirmingDelete,
    #[default]
    Closed,
}

impl FormMode {
    pub fn is_open(&self) -> bool {
        *self != Self::Closed
    }

    pub(crate) fn require(self, expected: FormMode) -> FormResult<()> {
        if self == expected {
            Ok(())
        } else {
            Err(FormError::WrongMode {
                expected,
                actual: self,
            })
        }
    }
}

impl fmt::Display for FormMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Editing => write!(f, "editing"),
            Self::ConfirmingDelete => write!(f, "confirming delete"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// How a request that did reach a directory service ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Accepted,
    Rejected(String),
    /// The user backed out at the confirmation prompt; nothing was sent.
    Declined,
}

impl Submission {
    pub fn is_accepted(&self) -> bool {
        *self == Self::Accepted
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct FormLimits {
    #[serde(default = "defaults::note_max_chars")]
    pub note_max_chars: usize,
    #[serde(default = "defaults::circle_size_max")]
    pub circle_size_max: f64,
}

impl Default for FormLimits {
    fn default() -> Self {
        Self {
            note_max_chars: NOTE_MAX_CHARS,
            circle_size_max: CIRCLE_SIZE_MAX,
        }
    }
}

mod defaults {
    use crate::validation::{CIRCLE_SIZE_MAX, NOTE_MAX_CHARS};

    pub const fn note_max_chars() -> usize {
        NOTE_MAX_CHARS
    }

    pub const fn circle_size_max() -> f64 {
        CIRCLE_SIZE_MAX
    }
}
