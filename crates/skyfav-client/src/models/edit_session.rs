//! Inline rename of one favorite.

use skyfav_core::{same_city, ValidationError};
use skyfav_services::FavoriteId;

/// Open inline editor. At most one exists; opening another replaces it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    target_id: FavoriteId,
    editing_value: String,
    original_value: String,
}

impl EditSession {
    /// Seed both values with the favorite's current name.
    pub fn new(target_id: FavoriteId, current_city: &str) -> Self {
        Self {
            target_id,
            editing_value: current_city.to_string(),
            original_value: current_city.to_string(),
        }
    }

    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    pub fn editing_value(&self) -> &str {
        &self.editing_value
    }

    pub fn original_value(&self) -> &str {
        &self.original_value
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.editing_value = value.into();
    }

    /// The trimmed value to send, or why it cannot be sent. A value that
    /// normalizes to the original name is unchanged.
    pub fn validate(&self) -> Result<&str, ValidationError> {
        let trimmed = self.editing_value.trim();
        if trimmed.is_empty() {
            Err(ValidationError::EmptyCityName)
        } else if same_city(trimmed, &self.original_value) {
            Err(ValidationError::UnchangedCityName)
        } else {
            Ok(trimmed)
        }
    }

    /// Whether the save control is enabled.
    pub fn can_commit(&self) -> bool {
        self.validate().is_ok()
    }
}

/// Where a pointer or focus event landed, relative to the open editor.
///
/// The view fills this in from its own hit testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InteractionTarget {
    /// Inside the edit input's region
    pub inside_edit_region: bool,
    /// On a button or other recognized control
    pub on_control: bool,
}

impl InteractionTarget {
    pub fn outside() -> Self {
        Self::default()
    }

    pub fn inside_editor() -> Self {
        Self {
            inside_edit_region: true,
            on_control: false,
        }
    }

    pub fn control() -> Self {
        Self {
            inside_edit_region: false,
            on_control: true,
        }
    }

    /// Save and delete buttons sit outside the input but must not cancel.
    pub fn cancels_edit(&self) -> bool {
        !self.inside_edit_region && !self.on_control
    }
}
