use serde::{Deserialize, Serialize};

/// A keyboard key or gamepad button.
///
/// Character keys are stored lowercase so `W` and `w` are the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Key {
    Char(char),
    Space,
    Shift,
    Control,
    Escape,
    Enter,
    Tab,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Gamepad(u8),
}

impl Key {
    pub fn char(c: char) -> Self {
        Key::Char(c.to_ascii_lowercase())
    }

    /// Parse a DOM-style key name (`"a"`, `" "`, `"Shift"`, `"ArrowUp"`).
    pub fn from_name(name: &str) -> Option<Self> {
        let key = match name {
            " " | "Space" => Key::Space,
            "Shift" => Key::Shift,
            "Control" => Key::Control,
            "Escape" => Key::Escape,
            "Enter" => Key::Enter,
            "Tab" => Key::Tab,
            "ArrowUp" => Key::ArrowUp,
            "ArrowDown" => Key::ArrowDown,
            "ArrowLeft" => Key::ArrowLeft,
            "ArrowRight" => Key::ArrowRight,
            _ => {
                let mut chars = name.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Key::char(c),
                    _ => return None,
                }
            }
        };
        Some(key)
    }
}

/// Pointer button, numbered like DOM `MouseEvent.button`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    Other(u16),
}

impl MouseButton {
    pub fn index(self) -> u16 {
        match self {
            MouseButton::Left => 0,
            MouseButton::Middle => 1,
            MouseButton::Right => 2,
            MouseButton::Other(n) => n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_parse() {
        assert_eq!(Key::from_name("a"), Some(Key::Char('a')));
        assert_eq!(Key::from_name("A"), Some(Key::Char('a')));
        assert_eq!(Key::from_name(" "), Some(Key::Space));
        assert_eq!(Key::from_name("ArrowLeft"), Some(Key::ArrowLeft));
        assert_eq!(Key::from_name("F13"), None);
    }

    #[test]
    fn button_indices_match_dom() {
        assert_eq!(MouseButton::Left.index(), 0);
        assert_eq!(MouseButton::Right.index(), 2);
        assert_eq!(MouseButton::Other(4).index(), 4);
    }
}
