//! Keyboard routing: maps key presses to board commands.

use crate::tools::{CreateAction, ToolMode};
use serde::{Deserialize, Serialize};

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const CTRL: Self = Self {
        ctrl: true,
        ..Self::NONE
    };

    pub const CTRL_SHIFT: Self = Self {
        ctrl: true,
        shift: true,
        ..Self::NONE
    };

    /// Ctrl on most platforms, Cmd on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }

    /// Parse a chord such as `ctrl+shift+z` into modifiers and key.
    pub fn parse_chord(chord: &str) -> (Self, String) {
        let mut mods = Self::NONE;
        let mut parts: Vec<&str> = chord.split('+').collect();
        // A trailing empty part means the key itself was '+'
        let key = match parts.pop() {
            Some("") if !parts.is_empty() => {
                parts.pop();
                "+".to_string()
            }
            Some(key) => key.to_string(),
            None => String::new(),
        };
        for part in parts {
            match part.to_ascii_lowercase().as_str() {
                "ctrl" | "control" => mods.ctrl = true,
                "cmd" | "meta" | "super" => mods.meta = true,
                "shift" => mods.shift = true,
                "alt" | "option" => mods.alt = true,
                _ => {}
            }
        }
        (mods, key)
    }
}

/// Keyboard event type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyEvent {
    Pressed(String),
    Released(String),
}

/// Board-level command produced by a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    SetMode(ToolMode),
    Create(CreateAction),
    Undo,
    Redo,
    DeleteSelection,
    ZoomIn,
    ZoomOut,
    Save,
    /// Leave text editing or abandon a stroke.
    Escape,
}

/// Map a pressed key to a command.
///
/// Single-key bindings only apply when no text field has focus; while one
/// does, only save and escape get through so typing is never hijacked.
pub fn resolve(key: &str, modifiers: Modifiers, text_focused: bool) -> Option<Command> {
    if modifiers.command() {
        let command = match key.to_ascii_lowercase().as_str() {
            "z" if modifiers.shift => Command::Redo,
            "z" => Command::Undo,
            "y" => Command::Redo,
            "+" | "=" => Command::ZoomIn,
            "-" | "_" => Command::ZoomOut,
            "s" => Command::Save,
            _ => return None,
        };
        if text_focused && command != Command::Save {
            return None;
        }
        return Some(command);
    }

    if key.eq_ignore_ascii_case("escape") {
        return Some(Command::Escape);
    }
    if text_focused || modifiers.alt {
        return None;
    }

    let command = match key.to_ascii_lowercase().as_str() {
        "v" => Command::SetMode(ToolMode::Select),
        "p" => Command::SetMode(ToolMode::Draw),
        "e" => Command::SetMode(ToolMode::Eraser),
        "r" => Command::Create(CreateAction::Rectangle),
        "c" => Command::Create(CreateAction::Circle),
        "s" => Command::Create(CreateAction::StickyNote),
        "t" => Command::Create(CreateAction::Text),
        "l" => Command::Create(CreateAction::Line),
        "a" => Command::Create(CreateAction::Arrow),
        "delete" | "backspace" => Command::DeleteSelection,
        _ => return None,
    };
    Some(command)
}

/// A keyboard shortcut definition.
#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: &'static str,
    pub ctrl: bool,
    pub shift: bool,
    pub description: &'static str,
    pub command: Command,
}

impl Shortcut {
    pub const fn new(
        key: &'static str,
        ctrl: bool,
        shift: bool,
        description: &'static str,
        command: Command,
    ) -> Self {
        Self {
            key,
            ctrl,
            shift,
            description,
            command,
        }
    }

    /// Format the shortcut for display (e.g., "Ctrl+S").
    pub fn format(&self) -> String {
        let mut parts = Vec::new();
        if self.ctrl {
            parts.push("Ctrl");
        }
        if self.shift {
            parts.push("Shift");
        }
        parts.push(self.key);
        parts.join("+")
    }

    pub fn modifiers(&self) -> Modifiers {
        Modifiers {
            ctrl: self.ctrl,
            shift: self.shift,
            ..Modifiers::NONE
        }
    }
}

/// Registry of all keyboard shortcuts.
pub struct ShortcutRegistry;

impl ShortcutRegistry {
    /// Get all registered shortcuts.
    pub fn all() -> Vec<Shortcut> {
        use Command::*;
        vec![
            Shortcut::new("V", false, false, "Select tool", SetMode(ToolMode::Select)),
            Shortcut::new("P", false, false, "Freehand draw", SetMode(ToolMode::Draw)),
            Shortcut::new("E", false, false, "Eraser", SetMode(ToolMode::Eraser)),
            Shortcut::new("R", false, false, "Add rectangle", Create(CreateAction::Rectangle)),
            Shortcut::new("C", false, false, "Add circle", Create(CreateAction::Circle)),
            Shortcut::new("S", false, false, "Add sticky note", Create(CreateAction::StickyNote)),
            Shortcut::new("T", false, false, "Add text", Create(CreateAction::Text)),
            Shortcut::new("L", false, false, "Add line", Create(CreateAction::Line)),
            Shortcut::new("A", false, false, "Add arrow", Create(CreateAction::Arrow)),
            Shortcut::new("Z", true, false, "Undo", Undo),
            Shortcut::new("Z", true, true, "Redo", Redo),
            Shortcut::new("Y", true, false, "Redo", Redo),
            Shortcut::new("+", true, false, "Zoom in", ZoomIn),
            Shortcut::new("=", true, false, "Zoom in", ZoomIn),
            Shortcut::new("-", true, false, "Zoom out", ZoomOut),
            Shortcut::new("S", true, false, "Save whiteboard", Save),
            Shortcut::new("Delete", false, false, "Delete selected objects", DeleteSelection),
            Shortcut::new("Backspace", false, false, "Delete selected objects", DeleteSelection),
            Shortcut::new("Escape", false, false, "Stop editing or drawing", Escape),
        ]
    }

    /// Describe all shortcuts, one per line.
    pub fn describe() -> String {
        Self::all()
            .iter()
            .map(|s| format!("  {:20} {}", s.format(), s.description))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_entries_resolve() {
        for shortcut in ShortcutRegistry::all() {
            assert_eq!(
                resolve(shortcut.key, shortcut.modifiers(), false),
                Some(shortcut.command),
                "{}",
                shortcut.format()
            );
        }
    }

    #[test]
    fn test_single_keys_are_case_insensitive() {
        assert_eq!(
            resolve("R", Modifiers::NONE, false),
            Some(Command::Create(CreateAction::Rectangle))
        );
        assert_eq!(
            resolve("p", Modifiers::NONE, false),
            Some(Command::SetMode(ToolMode::Draw))
        );
    }

    #[test]
    fn test_focused_text_blocks_single_keys() {
        assert_eq!(resolve("s", Modifiers::NONE, true), None);
        assert_eq!(resolve("Backspace", Modifiers::NONE, true), None);
        assert_eq!(resolve("z", Modifiers::CTRL, true), None);
        assert_eq!(resolve("s", Modifiers::CTRL, true), Some(Command::Save));
        assert_eq!(resolve("Escape", Modifiers::NONE, true), Some(Command::Escape));
    }

    #[test]
    fn test_modifier_changes_meaning() {
        assert_eq!(resolve("s", Modifiers::CTRL, false), Some(Command::Save));
        assert_eq!(resolve("a", Modifiers::CTRL, false), None);
        let cmd = Modifiers {
            meta: true,
            ..Modifiers::NONE
        };
        assert_eq!(resolve("z", cmd, false), Some(Command::Undo));
        assert_eq!(resolve("z", Modifiers::CTRL_SHIFT, false), Some(Command::Redo));
    }

    #[test]
    fn test_unknown_keys_ignored() {
        assert_eq!(resolve("q", Modifiers::NONE, false), None);
        assert_eq!(resolve("F5", Modifiers::NONE, false), None);
        assert_eq!(resolve("r", Modifiers { alt: true, ..Modifiers::NONE }, false), None);
    }

    #[test]
    fn test_parse_chord() {
        assert_eq!(Modifiers::parse_chord("ctrl+shift+z"), (Modifiers::CTRL_SHIFT, "z".into()));
        assert_eq!(Modifiers::parse_chord("ctrl++"), (Modifiers::CTRL, "+".into()));
        assert_eq!(Modifiers::parse_chord("Delete"), (Modifiers::NONE, "Delete".into()));
        assert_eq!(Modifiers::parse_chord("+"), (Modifiers::NONE, "+".into()));
    }
}
