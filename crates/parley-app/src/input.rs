//! Terminal-agnostic keyboard input.

/// Keyboard input abstraction.
///
/// Decouples the console from terminal libraries so key sequences can be
/// replayed in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    /// Printable character, including space.
    Char(char),
    /// Enter/Return key (submit).
    Enter,
    /// Backspace key (delete the last character).
    Backspace,
    /// Escape key (quit).
    Esc,
}
