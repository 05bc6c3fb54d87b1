use crate::core::input::Key;
use crate::domain::config::KeyBindings;

const ESC: u8 = 0x1b;

/// Bytes sent to the device for one key press
pub fn encode_key(key: Key, bindings: &KeyBindings) -> Vec<u8> {
    match key {
        Key::Char(c) => {
            let mut buf = [0u8; 4];
            c.encode_utf8(&mut buf).as_bytes().to_vec()
        }
        Key::Ctrl(c) if c.is_ascii() => vec![KeyBindings::control_code(c)],
        Key::Ctrl(_) => Vec::new(),
        Key::Enter => bindings.enter_sequence.as_bytes().to_vec(),
        Key::Backspace => vec![bindings.backspace_byte],
        Key::Tab => vec![b'\t'],
        Key::Esc => vec![ESC],
        Key::Up => vec![ESC, b'[', b'A'],
        Key::Down => vec![ESC, b'[', b'B'],
        Key::Right => vec![ESC, b'[', b'C'],
        Key::Left => vec![ESC, b'[', b'D'],
        Key::Home => vec![ESC, b'[', b'H'],
        Key::End => vec![ESC, b'[', b'F'],
        Key::Delete => vec![ESC, b'[', b'3', b'~'],
    }
}
