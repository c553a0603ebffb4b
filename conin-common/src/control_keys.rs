// Copyright (C) 2024-2025 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

bitflags::bitflags! {
    /// Modifier and lock key state attached to key and mouse records.
    ///
    /// Values match the console `dwControlKeyState` bits so records can be
    /// handed to legacy consumers without translation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ControlKeyState: u32 {
        const RIGHT_ALT_PRESSED = 0x0001;
        const LEFT_ALT_PRESSED = 0x0002;
        const RIGHT_CTRL_PRESSED = 0x0004;
        const LEFT_CTRL_PRESSED = 0x0008;
        const SHIFT_PRESSED = 0x0010;
        const NUMLOCK_ON = 0x0020;
        const SCROLLLOCK_ON = 0x0040;
        const CAPSLOCK_ON = 0x0080;
        const ENHANCED_KEY = 0x0100;

        const ALT_PRESSED = Self::RIGHT_ALT_PRESSED.bits() | Self::LEFT_ALT_PRESSED.bits();
        const CTRL_PRESSED = Self::RIGHT_CTRL_PRESSED.bits() | Self::LEFT_CTRL_PRESSED.bits();
    }
}

impl ControlKeyState {
    #[must_use]
    pub const fn is_ctrl_pressed(self) -> bool {
        self.intersects(Self::CTRL_PRESSED)
    }

    #[must_use]
    pub const fn is_alt_pressed(self) -> bool {
        self.intersects(Self::ALT_PRESSED)
    }
}
