//! Key codes and their display names.
//!
//! Key codes use the legacy DOM `keyCode` numbering (`13` = Enter, `27` =
//! Escape, `65` = A, ...). Hosts with a different native key representation
//! convert into this numbering at the input boundary (see the `bevy` module).

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

/// Platform key code identifying a physical key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyCode(pub u32);

impl KeyCode {
    /// The conventional cancel/menu key. Always bound after defaulting.
    pub const ESCAPE: Self = Self(27);
    pub const ENTER: Self = Self(13);

    pub const fn new(code: u32) -> Self {
        Self(code)
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    pub fn is_escape(self) -> bool {
        self == Self::ESCAPE
    }
}

impl From<u32> for KeyCode {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Default English names for the common key codes.
const ENGLISH_KEY_NAMES: &[(u32, &str)] = &[
    (8, "Backspace"),
    (9, "Tab"),
    (13, "Enter"),
    (16, "Shift"),
    (17, "Ctrl"),
    (18, "Alt"),
    (19, "Pause"),
    (20, "Caps Lock"),
    (27, "Escape"),
    (32, "Space"),
    (33, "Page Up"),
    (34, "Page Down"),
    (35, "End"),
    (36, "Home"),
    (37, "Arrow Left"),
    (38, "Arrow Up"),
    (39, "Arrow Right"),
    (40, "Arrow Down"),
    (44, "Print Screen"),
    (45, "Insert"),
    (46, "Delete"),
    (48, "0"),
    (49, "1"),
    (50, "2"),
    (51, "3"),
    (52, "4"),
    (53, "5"),
    (54, "6"),
    (55, "7"),
    (56, "8"),
    (57, "9"),
    (65, "A"),
    (66, "B"),
    (67, "C"),
    (68, "D"),
    (69, "E"),
    (70, "F"),
    (71, "G"),
    (72, "H"),
    (73, "I"),
    (74, "J"),
    (75, "K"),
    (76, "L"),
    (77, "M"),
    (78, "N"),
    (79, "O"),
    (80, "P"),
    (81, "Q"),
    (82, "R"),
    (83, "S"),
    (84, "T"),
    (85, "U"),
    (86, "V"),
    (87, "W"),
    (88, "X"),
    (89, "Y"),
    (90, "Z"),
    (91, "Left Window Key"),
    (92, "Right Window Key"),
    (93, "Select Key"),
    (96, "Numpad 0"),
    (97, "Numpad 1"),
    (98, "Numpad 2"),
    (99, "Numpad 3"),
    (100, "Numpad 4"),
    (101, "Numpad 5"),
    (102, "Numpad 6"),
    (103, "Numpad 7"),
    (104, "Numpad 8"),
    (105, "Numpad 9"),
    (106, "Multiply"),
    (107, "Add"),
    (109, "Subtract"),
    (110, "Decimal"),
    (111, "Divide"),
    (112, "F1"),
    (113, "F2"),
    (114, "F3"),
    (115, "F4"),
    (116, "F5"),
    (117, "F6"),
    (118, "F7"),
    (119, "F8"),
    (120, "F9"),
    (121, "F10"),
    (122, "F11"),
    (123, "F12"),
    (144, "Num Lock"),
    (145, "Scroll Lock"),
    (186, "Semi-colon"),
    (187, "Equal"),
    (188, "Comma"),
    (189, "Dash"),
    (190, "Period"),
    (191, "Forward Slash"),
    (219, "Open Bracket"),
    (220, "Back Slash"),
    (221, "Close Bracket"),
    (222, "Single Quote"),
];

/// Lookup table from key code to display name.
///
/// Starts from the English defaults; configuration may override single
/// entries (for localization or custom keyboards).
#[derive(Clone, Debug)]
pub struct KeyCatalog {
    names: BTreeMap<KeyCode, String>,
}

impl KeyCatalog {
    /// Catalog with the English default names.
    pub fn english() -> Self {
        let names = ENGLISH_KEY_NAMES
            .iter()
            .map(|(code, name)| (KeyCode(*code), (*name).to_string()))
            .collect();
        Self { names }
    }

    /// Override (or add) the display name of a key.
    pub fn set_name(&mut self, key: KeyCode, name: impl Into<String>) {
        self.names.insert(key, name.into());
    }

    /// The configured name, if any.
    pub fn name(&self, key: KeyCode) -> Option<&str> {
        self.names.get(&key).map(String::as_str)
    }

    /// The configured name or `Key_<code>` for unknown keys.
    pub fn display_name(&self, key: KeyCode) -> Cow<'_, str> {
        match self.name(key) {
            Some(name) => Cow::Borrowed(name),
            None => Cow::Owned(format!("Key_{}", key.0)),
        }
    }
}

impl Default for KeyCatalog {
    fn default() -> Self {
        Self::english()
    }
}
