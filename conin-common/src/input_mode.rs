// Copyright (C) 2024-2025 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

bitflags::bitflags! {
    /// Console input mode flags.
    ///
    /// The input buffer only stores these. Apart from
    /// `VIRTUAL_TERMINAL_INPUT` and `MOUSE_INPUT` the behaviour each flag
    /// selects lives in the layers that read from the buffer.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct InputMode: u32 {
        /// Ctrl+C is intercepted instead of delivered as input.
        const PROCESSED_INPUT = 0x0001;
        /// Reads return only once a line is complete.
        const LINE_INPUT = 0x0002;
        const ECHO_INPUT = 0x0004;
        const WINDOW_INPUT = 0x0008;
        const MOUSE_INPUT = 0x0010;
        const INSERT_MODE = 0x0020;
        const QUICK_EDIT_MODE = 0x0040;
        const EXTENDED_FLAGS = 0x0080;
        const AUTO_POSITION = 0x0100;
        const VIRTUAL_TERMINAL_INPUT = 0x0200;
    }
}

impl Default for InputMode {
    fn default() -> Self {
        Self::LINE_INPUT | Self::PROCESSED_INPUT | Self::ECHO_INPUT | Self::MOUSE_INPUT
    }
}
