// src/session.rs

/// Which record, if any, the form is currently editing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EditSession {
    /// Creating a new workout (or nothing open at all).
    #[default]
    Idle,
    Editing(String),
}

impl EditSession {
    pub fn begin(&mut self, id: impl Into<String>) {
        *self = Self::Editing(id.into());
    }

    /// Returns to `Idle`, yielding the id that was being edited.
    pub fn finish(&mut self) -> Option<String> {
        match std::mem::take(self) {
            Self::Editing(id) => Some(id),
            Self::Idle => None,
        }
    }

    pub fn editing_id(&self) -> Option<&str> {
        match self {
            Self::Editing(id) => Some(id),
            Self::Idle => None,
        }
    }

    pub const fn is_editing(&self) -> bool {
        matches!(self, Self::Editing(_))
    }
}
