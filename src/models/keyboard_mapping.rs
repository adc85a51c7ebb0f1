use crate::models::snap_action::SnapAction;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Modifier keys for keyboard shortcuts.
///
/// Declaration order is the macOS menu rendering order, so iterating a
/// `BTreeSet<ModifierKey>` yields `⌃⌥⇧⌘`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModifierKey {
    /// Control key (⌃)
    Control,
    /// Option/Alt key (⌥)
    Option,
    /// Shift key (⇧)
    Shift,
    /// Command key (⌘)
    Command,
}

impl ModifierKey {
    pub fn symbol(self) -> &'static str {
        match self {
            ModifierKey::Control => "⌃",
            ModifierKey::Option => "⌥",
            ModifierKey::Shift => "⇧",
            ModifierKey::Command => "⌘",
        }
    }

    fn token(self) -> &'static str {
        match self {
            ModifierKey::Control => "ctrl",
            ModifierKey::Option => "opt",
            ModifierKey::Shift => "shift",
            ModifierKey::Command => "cmd",
        }
    }

    fn parse_token(token: &str) -> Option<Self> {
        match token {
            "ctrl" | "control" => Some(ModifierKey::Control),
            "opt" | "option" | "alt" => Some(ModifierKey::Option),
            "shift" => Some(ModifierKey::Shift),
            "cmd" | "command" => Some(ModifierKey::Command),
            _ => None,
        }
    }
}

/// Arrow key directions
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ArrowDirection {
    Up,
    Down,
    Left,
    Right,
}

/// Regular keys for keyboard shortcuts
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Key {
    /// Letter keys A-Z
    Letter(char),
    /// Number keys 0-9
    Number(u8),
    /// Arrow keys
    Arrow(ArrowDirection),
    Space,
    Return,
    Tab,
    Escape,
}

impl Key {
    /// Menu symbol for the key. Keys without a compact glyph render empty.
    pub fn symbol(self) -> String {
        match self {
            Key::Letter(c) => c.to_ascii_uppercase().to_string(),
            Key::Number(n) => n.to_string(),
            Key::Arrow(ArrowDirection::Up) => "↑".to_string(),
            Key::Arrow(ArrowDirection::Down) => "↓".to_string(),
            Key::Arrow(ArrowDirection::Left) => "←".to_string(),
            Key::Arrow(ArrowDirection::Right) => "→".to_string(),
            Key::Space | Key::Return | Key::Tab | Key::Escape => String::new(),
        }
    }

    fn token(self) -> String {
        match self {
            Key::Letter(c) => c.to_ascii_lowercase().to_string(),
            Key::Number(n) => n.to_string(),
            Key::Arrow(ArrowDirection::Up) => "up".to_string(),
            Key::Arrow(ArrowDirection::Down) => "down".to_string(),
            Key::Arrow(ArrowDirection::Left) => "left".to_string(),
            Key::Arrow(ArrowDirection::Right) => "right".to_string(),
            Key::Space => "space".to_string(),
            Key::Return => "return".to_string(),
            Key::Tab => "tab".to_string(),
            Key::Escape => "escape".to_string(),
        }
    }

    fn parse_token(token: &str) -> Option<Self> {
        let key = match token {
            "up" => Key::Arrow(ArrowDirection::Up),
            "down" => Key::Arrow(ArrowDirection::Down),
            "left" => Key::Arrow(ArrowDirection::Left),
            "right" => Key::Arrow(ArrowDirection::Right),
            "space" => Key::Space,
            "return" | "enter" => Key::Return,
            "tab" => Key::Tab,
            "escape" | "esc" => Key::Escape,
            single => {
                let mut chars = single.chars();
                let (Some(c), None) = (chars.next(), chars.next()) else {
                    return None;
                };
                if c.is_ascii_alphabetic() {
                    Key::Letter(c.to_ascii_lowercase())
                } else {
                    Key::Number(c.to_digit(10)? as u8)
                }
            }
        };
        Some(key)
    }
}

/// Errors that can occur with keyboard mappings
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyboardMappingError {
    #[error("Shortcut is empty")]
    Empty,

    #[error("Unrecognized key or modifier: {0}")]
    InvalidKey(String),

    #[error("Shortcut must have at least one modifier key")]
    NoModifiers,

    #[error("Conflicting keyboard shortcut {shortcut} for {first} and {second}")]
    ConflictingShortcut {
        shortcut: String,
        first: SnapAction,
        second: SnapAction,
    },
}

/// Complete keyboard shortcut combination
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ShortcutCombination {
    /// Modifier keys that must be held
    pub modifiers: BTreeSet<ModifierKey>,
    /// Primary key to press
    pub key: Key,
}

impl ShortcutCombination {
    pub fn new(modifiers: impl IntoIterator<Item = ModifierKey>, key: Key) -> Self {
        Self {
            modifiers: modifiers.into_iter().collect(),
            key,
        }
    }

    /// Global shortcuts need at least one modifier.
    pub fn validate(&self) -> Result<(), KeyboardMappingError> {
        if self.modifiers.is_empty() {
            return Err(KeyboardMappingError::NoModifiers);
        }
        Ok(())
    }

    /// Menu-style rendering, e.g. `⌥⌘←`
    pub fn symbols(&self) -> String {
        let mut rendered: String = self.modifiers.iter().map(|m| m.symbol()).collect();
        rendered.push_str(&self.key.symbol());
        rendered
    }

    /// Default binding for an action
    pub fn default_for(action: SnapAction) -> Self {
        use ArrowDirection::{Left, Right, Up};
        use ModifierKey::{Command, Option};

        match action {
            SnapAction::Maximize => Self::new([Command], Key::Arrow(Up)),
            SnapAction::Left => Self::new([Command], Key::Arrow(Left)),
            SnapAction::Right => Self::new([Command], Key::Arrow(Right)),
            SnapAction::LeftThird => Self::new([Option, Command], Key::Arrow(Left)),
            SnapAction::CenterThird => Self::new([Option, Command], Key::Arrow(Up)),
            SnapAction::RightThird => Self::new([Option, Command], Key::Arrow(Right)),
        }
    }
}

impl FromStr for ShortcutCombination {
    type Err = KeyboardMappingError;

    /// Parses `mod+mod+key`, e.g. `opt+cmd+left`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        let mut tokens: Vec<&str> = lowered.split('+').map(str::trim).collect();
        let key_token = match tokens.pop() {
            Some(token) if !token.is_empty() => token,
            _ => return Err(KeyboardMappingError::Empty),
        };

        let key = Key::parse_token(key_token)
            .ok_or_else(|| KeyboardMappingError::InvalidKey(key_token.to_string()))?;

        let modifiers = tokens
            .into_iter()
            .map(|token| {
                ModifierKey::parse_token(token)
                    .ok_or_else(|| KeyboardMappingError::InvalidKey(token.to_string()))
            })
            .collect::<Result<BTreeSet<_>, _>>()?;

        let combination = Self { modifiers, key };
        combination.validate()?;
        Ok(combination)
    }
}

/// Canonical text form, the one written to settings files
impl fmt::Display for ShortcutCombination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for modifier in &self.modifiers {
            write!(f, "{}+", modifier.token())?;
        }
        f.write_str(&self.key.token())
    }
}

/// A shortcut bound to a snap action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyboardMapping {
    pub shortcut: ShortcutCombination,
    pub action: SnapAction,
}

/// Collection of keyboard mappings with unique shortcuts
#[derive(Debug, Clone, Default)]
pub struct KeyboardMappingSet {
    pub mappings: Vec<KeyboardMapping>,
}

impl KeyboardMappingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a mapping, rejecting a shortcut already bound to another action.
    /// Re-binding an action replaces its previous shortcut.
    pub fn add_mapping(&mut self, mapping: KeyboardMapping) -> Result<(), KeyboardMappingError> {
        mapping.shortcut.validate()?;

        if let Some(existing) = self
            .mappings
            .iter()
            .find(|m| m.shortcut == mapping.shortcut && m.action != mapping.action)
        {
            return Err(KeyboardMappingError::ConflictingShortcut {
                shortcut: mapping.shortcut.to_string(),
                first: existing.action,
                second: mapping.action,
            });
        }

        self.mappings.retain(|m| m.action != mapping.action);
        self.mappings.push(mapping);
        Ok(())
    }

    pub fn find_by_shortcut(&self, combination: &ShortcutCombination) -> Option<&KeyboardMapping> {
        self.mappings.iter().find(|m| &m.shortcut == combination)
    }

    pub fn shortcut_for(&self, action: SnapAction) -> Option<&ShortcutCombination> {
        self.mappings
            .iter()
            .find(|m| m.action == action)
            .map(|m| &m.shortcut)
    }

    /// Bindings used when no settings file overrides them
    pub fn create_default() -> Self {
        let mappings = SnapAction::ALL
            .into_iter()
            .map(|action| KeyboardMapping {
                shortcut: ShortcutCombination::default_for(action),
                action,
            })
            .collect();
        Self { mappings }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shortcut_parsing() {
        let combination: ShortcutCombination = "cmd+opt+Left".parse().unwrap();
        assert_eq!(
            combination,
            ShortcutCombination::new(
                [ModifierKey::Option, ModifierKey::Command],
                Key::Arrow(ArrowDirection::Left)
            )
        );

        let letter: ShortcutCombination = "control+shift+K".parse().unwrap();
        assert_eq!(letter.key, Key::Letter('k'));
    }

    #[test]
    fn test_shortcut_parsing_errors() {
        assert_eq!("".parse::<ShortcutCombination>(), Err(KeyboardMappingError::Empty));
        assert_eq!(
            "left".parse::<ShortcutCombination>(),
            Err(KeyboardMappingError::NoModifiers)
        );
        assert_eq!(
            "hyper+left".parse::<ShortcutCombination>(),
            Err(KeyboardMappingError::InvalidKey("hyper".to_string()))
        );
        assert!("cmd+f13".parse::<ShortcutCombination>().is_err());
    }

    #[test]
    fn test_shortcut_symbols_follow_menu_order() {
        let combination: ShortcutCombination = "cmd+shift+opt+ctrl+right".parse().unwrap();
        assert_eq!(combination.symbols(), "⌃⌥⇧⌘→");

        let plain: ShortcutCombination = "cmd+space".parse().unwrap();
        assert_eq!(plain.symbols(), "⌘");
    }

    #[test]
    fn test_shortcut_display_is_parseable() {
        for action in SnapAction::ALL {
            let shortcut = ShortcutCombination::default_for(action);
            let reparsed: ShortcutCombination = shortcut.to_string().parse().unwrap();
            assert_eq!(reparsed, shortcut);
        }
        assert_eq!(
            ShortcutCombination::default_for(SnapAction::RightThird).to_string(),
            "opt+cmd+right"
        );
    }

    #[test]
    fn test_default_mappings_are_unique() {
        let set = KeyboardMappingSet::create_default();
        assert_eq!(set.mappings.len(), SnapAction::ALL.len());

        let up = ShortcutCombination::new([ModifierKey::Command], Key::Arrow(ArrowDirection::Up));
        assert_eq!(set.find_by_shortcut(&up).unwrap().action, SnapAction::Maximize);
    }

    #[test]
    fn test_conflicting_mapping_rejected() {
        let mut set = KeyboardMappingSet::create_default();
        let result = set.add_mapping(KeyboardMapping {
            shortcut: ShortcutCombination::default_for(SnapAction::Left),
            action: SnapAction::Right,
        });
        assert!(matches!(
            result,
            Err(KeyboardMappingError::ConflictingShortcut { first: SnapAction::Left, .. })
        ));
    }

    #[test]
    fn test_rebinding_replaces_previous_shortcut() {
        let mut set = KeyboardMappingSet::create_default();
        let shortcut: ShortcutCombination = "ctrl+opt+m".parse().unwrap();
        set.add_mapping(KeyboardMapping {
            shortcut: shortcut.clone(),
            action: SnapAction::Maximize,
        })
        .unwrap();

        assert_eq!(set.shortcut_for(SnapAction::Maximize), Some(&shortcut));
        assert_eq!(set.mappings.len(), SnapAction::ALL.len());
    }
}
