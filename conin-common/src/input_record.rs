// Copyright (C) 2024-2025 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use core::fmt;

use crate::control_keys::ControlKeyState;

pub const VK_PAUSE: u16 = 0x13;
pub const VK_S: u16 = 0x53;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Coord {
    pub x: i16,
    pub y: i16,
}

impl Coord {
    #[must_use]
    pub const fn new(x: i16, y: i16) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyEvent {
    pub key_down: bool,
    pub repeat_count: u16,
    pub virtual_key_code: u16,
    pub virtual_scan_code: u16,
    /// UTF-16 code unit for wide records, or a code page byte for narrow ones.
    pub unicode_char: u16,
    pub control_key_state: ControlKeyState,
}

impl KeyEvent {
    /// Ctrl+S is treated as an alias for the pause key, as long as no Alt
    /// modifier is held.
    #[must_use]
    pub const fn is_pause_key(&self) -> bool {
        if self.virtual_key_code == VK_PAUSE {
            return true;
        }

        let ctrl_but_not_alt =
            self.control_key_state.is_ctrl_pressed() && !self.control_key_state.is_alt_pressed();
        ctrl_but_not_alt && self.virtual_key_code == VK_S
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MouseEvent {
    pub position: Coord,
    pub button_state: u32,
    pub control_key_state: ControlKeyState,
    pub event_flags: u32,
}

/// A single console input record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputRecord {
    Key(KeyEvent),
    Mouse(MouseEvent),
    WindowBufferSize(Coord),
    Menu(u32),
    Focus(bool),
}

impl Default for InputRecord {
    fn default() -> Self {
        Self::Key(KeyEvent::default())
    }
}

impl InputRecord {
    #[must_use]
    pub const fn synthesize_key_event(
        key_down: bool,
        repeat_count: u16,
        virtual_key_code: u16,
        virtual_scan_code: u16,
        unicode_char: u16,
        control_key_state: ControlKeyState,
    ) -> Self {
        Self::Key(KeyEvent {
            key_down,
            repeat_count,
            virtual_key_code,
            virtual_scan_code,
            unicode_char,
            control_key_state,
        })
    }

    #[must_use]
    pub const fn synthesize_focus_event(focused: bool) -> Self {
        Self::Focus(focused)
    }

    #[must_use]
    pub const fn synthesize_mouse_event(
        position: Coord,
        button_state: u32,
        control_key_state: ControlKeyState,
        event_flags: u32,
    ) -> Self {
        Self::Mouse(MouseEvent {
            position,
            button_state,
            control_key_state,
            event_flags,
        })
    }

    #[must_use]
    pub const fn as_key_event(&self) -> Option<&KeyEvent> {
        match self {
            Self::Key(key) => Some(key),
            _ => None,
        }
    }

    /// The character a text reader would see for this record: only key-down
    /// events with a non-zero character carry one.
    #[must_use]
    pub const fn decoded_char(&self) -> Option<u16> {
        match self {
            Self::Key(key) if key.key_down && key.unicode_char != 0 => Some(key.unicode_char),
            _ => None,
        }
    }
}

impl fmt::Display for InputRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => write!(
                f,
                "Key({} vk={:#04x} sc={:#04x} ch={:#06x} x{} {:?})",
                if key.key_down { "down" } else { "up" },
                key.virtual_key_code,
                key.virtual_scan_code,
                key.unicode_char,
                key.repeat_count,
                key.control_key_state
            ),
            Self::Mouse(mouse) => write!(
                f,
                "Mouse({},{} buttons={:#x} flags={:#x})",
                mouse.position.x, mouse.position.y, mouse.button_state, mouse.event_flags
            ),
            Self::WindowBufferSize(size) => write!(f, "WindowBufferSize({}x{})", size.x, size.y),
            Self::Menu(command) => write!(f, "Menu({command})"),
            Self::Focus(focused) => write!(f, "Focus({focused})"),
        }
    }
}
