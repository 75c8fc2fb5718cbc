use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// A request from the listener.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Intent {
    /// Album id exactly as typed
    LoadAlbum(String),
    NextSide,
    PrevSide,
    Quit,
}

/// Turns key presses into intents, buffering album-id digits until Enter.
#[derive(Debug, Default)]
pub struct KeyboardInput {
    buffer: String,
}

impl KeyboardInput {
    /// Digits typed so far.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn handle(&mut self, key: KeyEvent) -> Option<Intent> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('c') => Some(Intent::Quit),
                _ => None,
            };
        }

        match key.code {
            KeyCode::Enter => {
                if self.buffer.is_empty() {
                    None
                } else {
                    Some(Intent::LoadAlbum(std::mem::take(&mut self.buffer)))
                }
            }
            KeyCode::Char('d') => Some(Intent::NextSide),
            KeyCode::Char('a') => Some(Intent::PrevSide),
            KeyCode::Char(c) if c.is_ascii_digit() => {
                self.buffer.push(c);
                None
            }
            KeyCode::Backspace => {
                self.buffer.pop();
                None
            }
            KeyCode::Esc => {
                self.buffer.clear();
                None
            }
            _ => None,
        }
    }
}
