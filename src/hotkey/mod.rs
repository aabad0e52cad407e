//! Push-to-talk hotkey: event type and key-name parsing.
//!
//! The OS-level hook is in [`listener`]; this module maps the configurable
//! key name (X11-keysym style, e.g. `shift_r`, or plain names like `f9`)
//! onto an [`rdev::Key`].

pub mod listener;

pub use listener::HotkeyListener;

// ---------------------------------------------------------------------------
// HotkeyEvent
// ---------------------------------------------------------------------------

/// The only two events the pipeline consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyEvent {
    /// The push-to-talk key went down.
    Pressed,
    /// The push-to-talk key came back up.
    Released,
}

// ---------------------------------------------------------------------------
// parse_key
// ---------------------------------------------------------------------------

/// Resolve a case-insensitive key name to an [`rdev::Key`].
///
/// Accepts X11-keysym style modifier names (`shift_r`, `control_l`, …),
/// function keys, a handful of named keys, and single letters.  Returns
/// `None` for unknown names so startup can fail with a clear message.
///
/// # Examples
///
/// ```
/// use voice_relay::hotkey::parse_key;
///
/// assert_eq!(parse_key("shift_r"), Some(rdev::Key::ShiftRight));
/// assert_eq!(parse_key("F9"), Some(rdev::Key::F9));
/// assert_eq!(parse_key("q"), Some(rdev::Key::KeyQ));
/// assert_eq!(parse_key("not-a-key"), None);
/// ```
pub fn parse_key(name: &str) -> Option<rdev::Key> {
    use rdev::Key;

    let lower = name.to_ascii_lowercase();
    let key = match lower.as_str() {
        // Modifiers, X11-keysym style plus common aliases
        "shift_r" | "rshift" | "shiftright" => Key::ShiftRight,
        "shift_l" | "lshift" | "shiftleft" | "shift" => Key::ShiftLeft,
        "control_r" | "rctrl" | "controlright" => Key::ControlRight,
        "control_l" | "lctrl" | "controlleft" | "ctrl" | "control" => Key::ControlLeft,
        "alt_l" | "lalt" | "alt" => Key::Alt,
        "alt_r" | "ralt" | "altgr" => Key::AltGr,
        "super_l" | "super" | "meta" => Key::MetaLeft,
        "super_r" => Key::MetaRight,

        // Named keys
        "caps_lock" | "capslock" => Key::CapsLock,
        "space" => Key::Space,
        "return" | "enter" => Key::Return,
        "tab" => Key::Tab,
        "escape" | "esc" => Key::Escape,
        "backspace" => Key::Backspace,
        "home" => Key::Home,
        "end" => Key::End,
        "insert" => Key::Insert,
        "delete" => Key::Delete,
        "pause" => Key::Pause,

        // Function keys
        "f1" => Key::F1,
        "f2" => Key::F2,
        "f3" => Key::F3,
        "f4" => Key::F4,
        "f5" => Key::F5,
        "f6" => Key::F6,
        "f7" => Key::F7,
        "f8" => Key::F8,
        "f9" => Key::F9,
        "f10" => Key::F10,
        "f11" => Key::F11,
        "f12" => Key::F12,

        // Single letters
        other => {
            let mut chars = other.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => letter_key(c)?,
                _ => return None,
            }
        }
    };

    Some(key)
}

fn letter_key(c: char) -> Option<rdev::Key> {
    use rdev::Key;
    Some(match c {
        'a' => Key::KeyA,
        'b' => Key::KeyB,
        'c' => Key::KeyC,
        'd' => Key::KeyD,
        'e' => Key::KeyE,
        'f' => Key::KeyF,
        'g' => Key::KeyG,
        'h' => Key::KeyH,
        'i' => Key::KeyI,
        'j' => Key::KeyJ,
        'k' => Key::KeyK,
        'l' => Key::KeyL,
        'm' => Key::KeyM,
        'n' => Key::KeyN,
        'o' => Key::KeyO,
        'p' => Key::KeyP,
        'q' => Key::KeyQ,
        'r' => Key::KeyR,
        's' => Key::KeyS,
        't' => Key::KeyT,
        'u' => Key::KeyU,
        'v' => Key::KeyV,
        'w' => Key::KeyW,
        'x' => Key::KeyX,
        'y' => Key::KeyY,
        'z' => Key::KeyZ,
        _ => return None,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
