//! Widget state definitions.

/// The interaction state of one object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WidgetState {
    #[default]
    Normal,
    /// Part of the active selection.
    Selected,
    /// A text object receiving keystrokes.
    Editing,
}

impl WidgetState {
    /// Check if widget is selected (either just selected or editing).
    pub fn is_selected(&self) -> bool {
        matches!(self, Self::Selected | Self::Editing)
    }

    pub fn is_editing(&self) -> bool {
        matches!(self, Self::Editing)
    }
}
