//! Adapter to convert winit key events to our RawKeyEvent type
//!
//! Key names follow the W3C `KeyboardEvent.key` values where winit has an
//! equivalent (`"Enter"`, `"ArrowUp"`, `"Meta"`, `" "`), so predicates written
//! for web hosts work unchanged.

use winit::event::ElementState;
use winit::keyboard::{Key, ModifiersState, NamedKey};

use super::event::{KeyEventKind, Modifiers, RawKeyEvent};

/// Convert winit key event data to a raw engine event
///
/// Keys winit cannot name (dead keys, unidentified keys) come through with no
/// key name and will never match a predicate.
pub fn raw_event_from_winit(
    logical_key: &Key,
    state: ElementState,
    modifiers: ModifiersState,
) -> RawKeyEvent {
    let kind = match state {
        ElementState::Pressed => KeyEventKind::Press,
        ElementState::Released => KeyEventKind::Release,
    };
    let pressed = kind == KeyEventKind::Press;

    let mut ctrl = modifiers.control_key();
    let mut shift = modifiers.shift_key();
    let mut alt = modifiers.alt_key();
    let mut meta = modifiers.super_key();

    // Platforms disagree on whether ModifiersChanged arrives before or after the
    // modifier's own key event; report the modifier's flag the way browsers do
    if let Key::Named(named) = logical_key {
        match named {
            NamedKey::Control => ctrl = pressed,
            NamedKey::Shift => shift = pressed,
            NamedKey::Alt | NamedKey::AltGraph => alt = pressed,
            NamedKey::Super | NamedKey::Meta => meta = pressed,
            _ => {}
        }
    }

    RawKeyEvent {
        key: key_name(logical_key),
        mods: Modifiers::new(ctrl, shift, alt, meta),
        kind,
    }
}

/// W3C-style name for a winit logical key
pub fn key_name(logical_key: &Key) -> Option<String> {
    match logical_key {
        Key::Character(s) => Some(s.to_string()),
        Key::Named(named) => Some(
            match named {
                NamedKey::Space => " ",
                NamedKey::Super | NamedKey::Meta => "Meta",
                NamedKey::Control => "Control",
                NamedKey::Shift => "Shift",
                NamedKey::Alt => "Alt",
                NamedKey::Enter => "Enter",
                NamedKey::Escape => "Escape",
                NamedKey::Tab => "Tab",
                NamedKey::Backspace => "Backspace",
                NamedKey::Delete => "Delete",
                // Remaining variants are named after their W3C values
                other => return Some(format!("{:?}", other)),
            }
            .to_string(),
        ),
        Key::Unidentified(_) | Key::Dead(_) => None,
    }
}
