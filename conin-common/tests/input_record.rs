// Copyright (C) 2024-2025 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use conin_common::{
    control_keys::ControlKeyState,
    input_mode::InputMode,
    input_record::{Coord, InputRecord, KeyEvent, VK_PAUSE, VK_S},
};
use test_log::test;

fn key(virtual_key_code: u16, control_key_state: ControlKeyState) -> KeyEvent {
    KeyEvent {
        key_down: true,
        repeat_count: 1,
        virtual_key_code,
        virtual_scan_code: 0,
        unicode_char: 0,
        control_key_state,
    }
}

#[test]
fn test_default_record_is_empty_key_event() {
    let record = InputRecord::default();
    assert_eq!(record, InputRecord::Key(KeyEvent::default()));
    assert_eq!(record.decoded_char(), None);
}

#[test]
fn test_synthesized_key_event() {
    let record = InputRecord::synthesize_key_event(
        true,
        1,
        0,
        0,
        u16::from(b'A'),
        ControlKeyState::empty(),
    );
    let key = record.as_key_event().unwrap();
    assert!(key.key_down);
    assert_eq!(key.repeat_count, 1);
    assert_eq!(key.virtual_key_code, 0);
    assert_eq!(record.decoded_char(), Some(u16::from(b'A')));
}

#[test]
fn test_decoded_char_filters_key_up_and_empty() {
    let up = InputRecord::synthesize_key_event(false, 1, 0, 0, 0x41, ControlKeyState::empty());
    assert_eq!(up.decoded_char(), None);

    let no_char = InputRecord::synthesize_key_event(true, 1, 0x10, 0, 0, ControlKeyState::empty());
    assert_eq!(no_char.decoded_char(), None);

    assert_eq!(InputRecord::synthesize_focus_event(true).decoded_char(), None);
    assert_eq!(
        InputRecord::synthesize_mouse_event(Coord::new(1, 2), 1, ControlKeyState::empty(), 0)
            .decoded_char(),
        None
    );
}

#[test]
fn test_pause_key() {
    assert!(key(VK_PAUSE, ControlKeyState::empty()).is_pause_key());
    assert!(key(VK_S, ControlKeyState::LEFT_CTRL_PRESSED).is_pause_key());
    assert!(key(VK_S, ControlKeyState::RIGHT_CTRL_PRESSED | ControlKeyState::SHIFT_PRESSED)
        .is_pause_key());

    assert!(!key(VK_S, ControlKeyState::empty()).is_pause_key());
    assert!(
        !key(
            VK_S,
            ControlKeyState::LEFT_CTRL_PRESSED | ControlKeyState::RIGHT_ALT_PRESSED
        )
        .is_pause_key()
    );
    assert!(!key(0x41, ControlKeyState::LEFT_CTRL_PRESSED).is_pause_key());
}

#[test]
fn test_composite_control_flags() {
    assert_eq!(
        ControlKeyState::ALT_PRESSED,
        ControlKeyState::LEFT_ALT_PRESSED | ControlKeyState::RIGHT_ALT_PRESSED
    );
    assert_eq!(ControlKeyState::CTRL_PRESSED.bits(), 0x0c);
    assert!(ControlKeyState::RIGHT_CTRL_PRESSED.is_ctrl_pressed());
    assert!(!ControlKeyState::SHIFT_PRESSED.is_alt_pressed());
}

#[test]
fn test_default_input_mode() {
    let mode = InputMode::default();
    assert_eq!(mode.bits(), 0x0017);
    assert!(!mode.contains(InputMode::VIRTUAL_TERMINAL_INPUT));
}

#[test]
fn test_display() {
    assert_eq!(InputRecord::synthesize_focus_event(false).to_string(), "Focus(false)");
    assert_eq!(InputRecord::Menu(7).to_string(), "Menu(7)");
    assert_eq!(
        InputRecord::WindowBufferSize(Coord::new(80, 25)).to_string(),
        "WindowBufferSize(80x25)"
    );
    assert!(InputRecord::default().to_string().starts_with("Key(up"));
}
