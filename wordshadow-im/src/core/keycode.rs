//! Key code definitions and key event handling

use std::fmt;

/// Key symbol (keysym) values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Keysym(pub u32);

impl Keysym {
    // Common key symbols (XKB keysym values)
    pub const BACKSPACE: Keysym = Keysym(0xff08);
    pub const TAB: Keysym = Keysym(0xff09);
    pub const RETURN: Keysym = Keysym(0xff0d);
    pub const ESCAPE: Keysym = Keysym(0xff1b);
    pub const DELETE: Keysym = Keysym(0xffff);

    // Cursor movement
    pub const LEFT: Keysym = Keysym(0xff51);
    pub const RIGHT: Keysym = Keysym(0xff53);

    // Space
    pub const SPACE: Keysym = Keysym(0x0020);

    /// No symbol; the event carries its text instead
    pub const VOID_SYMBOL: Keysym = Keysym(0xffffff);

    /// Offset of the keysym range that maps directly onto Unicode code points
    const UNICODE_OFFSET: u32 = 0x0100_0000;

    /// Keysym for a character: ASCII maps to itself, everything else to the
    /// Unicode keysym range.
    pub fn from_char(c: char) -> Self {
        let cp = c as u32;
        if (0x0020..=0x007e).contains(&cp) {
            Keysym(cp)
        } else {
            Keysym(Self::UNICODE_OFFSET + cp)
        }
    }

    /// Check if this keysym represents a printable character
    pub fn is_printable(&self) -> bool {
        // ASCII printable range (0x20-0x7e) or a printable Unicode keysym
        (0x0020..=0x007e).contains(&self.0)
            || (self.0 > Self::UNICODE_OFFSET
                && char::from_u32(self.0 - Self::UNICODE_OFFSET).is_some_and(|c| !c.is_control()))
    }

    /// Try to convert this keysym to a character
    pub fn to_char(&self) -> Option<char> {
        if !self.is_printable() {
            None
        } else if self.0 > Self::UNICODE_OFFSET {
            char::from_u32(self.0 - Self::UNICODE_OFFSET)
        } else {
            char::from_u32(self.0)
        }
    }
}

impl fmt::Display for Keysym {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ch) = self.to_char() {
            write!(f, "{}", ch)
        } else {
            write!(f, "Keysym(0x{:04x})", self.0)
        }
    }
}

/// Key modifier flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyModifiers {
    pub shift_key: bool,
    pub control_key: bool,
    pub alt_key: bool,
}

/// A key event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    /// The key symbol
    pub keysym: Keysym,
    /// Modifier key state
    pub modifiers: KeyModifiers,
    /// Whether this is a key press (true) or release (false)
    pub is_press: bool,
    /// Literal text carried by a [`Keysym::VOID_SYMBOL`] event
    pub text: Option<String>,
}

impl KeyEvent {
    pub fn new(keysym: Keysym, modifiers: KeyModifiers, is_press: bool) -> Self {
        Self {
            keysym,
            modifiers,
            is_press,
            text: None,
        }
    }

    /// Create a simple key press event without modifiers
    pub fn press(keysym: Keysym) -> Self {
        Self::new(keysym, KeyModifiers::default(), true)
    }

    /// Create a key release event without modifiers
    pub fn release(keysym: Keysym) -> Self {
        Self::new(keysym, KeyModifiers::default(), false)
    }

    /// A press that inserts `text` without a matching key
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::press(Keysym::VOID_SYMBOL)
        }
    }

    /// Check if this is a printable character key press
    pub fn is_printable_press(&self) -> bool {
        self.is_press
            && self.keysym.is_printable()
            && !self.modifiers.control_key
            && !self.modifiers.alt_key
    }

    /// Get the character for this key event if it's a printable press
    pub fn to_char(&self) -> Option<char> {
        if self.is_printable_press() {
            self.keysym.to_char()
        } else {
            None
        }
    }
}
