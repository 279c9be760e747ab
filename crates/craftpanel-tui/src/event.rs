//! Event handling for the TUI.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Key action that can be performed in the TUI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    // Navigation
    MoveUp,
    MoveDown,
    JumpToTop,
    JumpToBottom,

    // Directory navigation
    Open,
    NavigateUp,

    // Selection and clipboard
    /// Toggle selection of the entry under the cursor (Space).
    ToggleSelect,
    /// Stage the selection for a move.
    Cut,
    /// Move staged entries into the current directory.
    Paste,

    // File operations
    Rename,
    Upload,
    Refresh,

    // Server lifecycle
    StartServer,
    StopServer,
    Backup,
    ConsoleCommand,
    /// Reopen the live channel after it dropped.
    Reconnect,

    // UI
    ToggleHelp,
    NextTab,
    PrevTab,

    /// Close dialogs, cancel a staged cut or clear the selection.
    Cancel,

    // Application
    Quit,
    ForceQuit,

    // No action
    None,
}

impl KeyAction {
    /// Convert a key event to an action.
    pub fn from_key_event(event: KeyEvent) -> Self {
        match (event.code, event.modifiers) {
            (KeyCode::Char('q'), KeyModifiers::NONE) => KeyAction::Quit,
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => KeyAction::ForceQuit,

            (KeyCode::Esc, _) => KeyAction::Cancel,

            // Navigation - vim style
            (KeyCode::Char('j'), KeyModifiers::NONE) => KeyAction::MoveDown,
            (KeyCode::Char('k'), KeyModifiers::NONE) => KeyAction::MoveUp,

            // Navigation - arrow keys
            (KeyCode::Down, _) => KeyAction::MoveDown,
            (KeyCode::Up, _) => KeyAction::MoveUp,

            // Jump
            (KeyCode::Char('g'), KeyModifiers::NONE) => KeyAction::JumpToTop,
            (KeyCode::Char('G'), KeyModifiers::SHIFT) => KeyAction::JumpToBottom,
            (KeyCode::Home, _) => KeyAction::JumpToTop,
            (KeyCode::End, _) => KeyAction::JumpToBottom,

            // Directory navigation
            (KeyCode::Enter, _) => KeyAction::Open,
            (KeyCode::Backspace, _) => KeyAction::NavigateUp,
            (KeyCode::Char('-'), KeyModifiers::NONE) => KeyAction::NavigateUp,

            // Selection and clipboard
            (KeyCode::Char(' '), KeyModifiers::NONE) => KeyAction::ToggleSelect,
            (KeyCode::Char('x'), KeyModifiers::NONE) => KeyAction::Cut,
            (KeyCode::Char('p'), KeyModifiers::NONE) => KeyAction::Paste,

            // File operations
            (KeyCode::Char('r'), KeyModifiers::NONE) => KeyAction::Rename,
            (KeyCode::Char('u'), KeyModifiers::NONE) => KeyAction::Upload,
            // Shift-R since r is rename
            (KeyCode::Char('R'), KeyModifiers::SHIFT) => KeyAction::Refresh,

            // Server lifecycle
            (KeyCode::Char('s'), KeyModifiers::NONE) => KeyAction::StartServer,
            (KeyCode::Char('S'), KeyModifiers::SHIFT) => KeyAction::StopServer,
            (KeyCode::Char('b'), KeyModifiers::NONE) => KeyAction::Backup,
            (KeyCode::Char('c'), KeyModifiers::NONE) => KeyAction::ConsoleCommand,
            (KeyCode::Char('L'), KeyModifiers::SHIFT) => KeyAction::Reconnect,

            (KeyCode::Char('?'), KeyModifiers::NONE) => KeyAction::ToggleHelp,
            (KeyCode::Char('?'), KeyModifiers::SHIFT) => KeyAction::ToggleHelp,

            // View switching
            (KeyCode::Tab, KeyModifiers::NONE) => KeyAction::NextTab,
            (KeyCode::BackTab, _) => KeyAction::PrevTab,

            _ => KeyAction::None,
        }
    }
}

/// A section of key bindings for the help display.
pub struct HelpSection {
    pub title: &'static str,
    pub bindings: Vec<KeyBinding>,
}

/// Key binding for display in help.
pub struct KeyBinding {
    pub keys: &'static str,
    pub description: &'static str,
}

/// Get all key bindings organized by section for help display.
pub fn get_help_sections() -> Vec<HelpSection> {
    vec![
        HelpSection {
            title: "Navigation",
            bindings: vec![
                KeyBinding { keys: "j/k ↑/↓", description: "Move down/up" },
                KeyBinding { keys: "g/G", description: "Jump to top/bottom" },
                KeyBinding { keys: "Enter", description: "Open directory" },
                KeyBinding { keys: "Backspace/-", description: "Parent directory" },
                KeyBinding { keys: "R", description: "Refresh listing" },
            ],
        },
        HelpSection {
            title: "Selection & Clipboard",
            bindings: vec![
                KeyBinding { keys: "Space", description: "Select entry" },
                KeyBinding { keys: "x", description: "Cut selection" },
                KeyBinding { keys: "p", description: "Paste into current directory" },
                KeyBinding { keys: "Esc", description: "Cancel cut / clear selection" },
            ],
        },
        HelpSection {
            title: "File Operations",
            bindings: vec![
                KeyBinding { keys: "r", description: "Rename (one selected entry)" },
                KeyBinding { keys: "u", description: "Upload local files" },
            ],
        },
        HelpSection {
            title: "Server",
            bindings: vec![
                KeyBinding { keys: "s", description: "Start server" },
                KeyBinding { keys: "S", description: "Stop server" },
                KeyBinding { keys: "b", description: "Run backup" },
                KeyBinding { keys: "c", description: "Send console command" },
                KeyBinding { keys: "L", description: "Reconnect live channel" },
            ],
        },
        HelpSection {
            title: "General",
            bindings: vec![
                KeyBinding { keys: "Tab/S-Tab", description: "Switch view tab" },
                KeyBinding { keys: "?", description: "Show this help" },
                KeyBinding { keys: "q", description: "Quit" },
            ],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyAction {
        KeyAction::from_key_event(KeyEvent::new(code, modifiers))
    }

    #[test]
    fn test_clipboard_keys() {
        assert_eq!(key(KeyCode::Char(' '), KeyModifiers::NONE), KeyAction::ToggleSelect);
        assert_eq!(key(KeyCode::Char('x'), KeyModifiers::NONE), KeyAction::Cut);
        assert_eq!(key(KeyCode::Char('p'), KeyModifiers::NONE), KeyAction::Paste);
        assert_eq!(key(KeyCode::Esc, KeyModifiers::NONE), KeyAction::Cancel);
    }

    #[test]
    fn test_shifted_keys_are_distinct() {
        assert_eq!(key(KeyCode::Char('r'), KeyModifiers::NONE), KeyAction::Rename);
        assert_eq!(key(KeyCode::Char('R'), KeyModifiers::SHIFT), KeyAction::Refresh);
        assert_eq!(key(KeyCode::Char('s'), KeyModifiers::NONE), KeyAction::StartServer);
        assert_eq!(key(KeyCode::Char('S'), KeyModifiers::SHIFT), KeyAction::StopServer);
    }

    #[test]
    fn test_quit_keys() {
        assert_eq!(key(KeyCode::Char('q'), KeyModifiers::NONE), KeyAction::Quit);
        assert_eq!(key(KeyCode::Char('c'), KeyModifiers::CONTROL), KeyAction::ForceQuit);
        assert_eq!(key(KeyCode::Char('c'), KeyModifiers::NONE), KeyAction::ConsoleCommand);
    }

    #[test]
    fn test_every_section_has_bindings() {
        let sections = get_help_sections();
        assert!(sections.iter().all(|s| !s.bindings.is_empty()));
        assert!(
            sections
                .iter()
                .flat_map(|s| &s.bindings)
                .any(|b| b.keys == "x")
        );
    }
}
