use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::trace;

// Enough digits for any page count we can render
const MAX_DIGITS: usize = 6;

/// Line input for the page jump prompt. Only accepts digits.
#[derive(Default)]
pub struct Inputter {
    current_input: String,
    curser_pos: usize,
    finished: bool,
    canceled: bool,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct InputResult {
    pub input: String,
    pub finished: bool,
    pub canceled: bool,
    pub curser_pos: usize,
}

impl InputResult {
    /// 1-based page number typed by the user.
    pub fn page_number(&self) -> Option<usize> {
        self.input.parse::<usize>().ok().filter(|&n| n > 0)
    }
}

impl Inputter {
    pub fn read(&mut self, key: KeyEvent) -> InputResult {
        match (key.code, key.modifiers) {
            (KeyCode::Enter, _) => self.enter(),
            (KeyCode::Esc, _) => self.escape(),
            (KeyCode::Backspace, _) => self.backspace(),
            (KeyCode::Left, _) => self.left(),
            (KeyCode::Right, _) => self.right(),
            (KeyCode::Char(c), KeyModifiers::NONE | KeyModifiers::SHIFT) => self.digit(c),
            _ => self.get(),
        }
    }

    pub fn get(&self) -> InputResult {
        InputResult {
            canceled: self.canceled,
            finished: self.finished,
            input: self.current_input.clone(),
            curser_pos: self.curser_pos,
        }
    }

    pub fn clear(&mut self) {
        self.canceled = false;
        self.finished = false;
        self.current_input.clear();
        self.curser_pos = 0;
    }

    fn enter(&mut self) -> InputResult {
        self.finished = true;
        self.get()
    }

    fn escape(&mut self) -> InputResult {
        self.clear();
        self.canceled = true;
        self.finished = true;
        self.get()
    }

    fn backspace(&mut self) -> InputResult {
        if self.curser_pos > 0 {
            self.current_input.remove(self.curser_pos - 1);
            self.curser_pos -= 1;
        }
        self.get()
    }

    fn left(&mut self) -> InputResult {
        self.curser_pos = self.curser_pos.saturating_sub(1);
        self.get()
    }

    fn right(&mut self) -> InputResult {
        if self.curser_pos < self.current_input.len() {
            self.curser_pos += 1;
        }
        self.get()
    }

    fn digit(&mut self, chr: char) -> InputResult {
        if chr.is_ascii_digit() && self.current_input.len() < MAX_DIGITS {
            // Input is ascii only, so char and byte positions are the same
            self.current_input.insert(self.curser_pos, chr);
            self.curser_pos += 1;
        } else {
            trace!("Ignoring input {chr:?}");
        }
        self.get()
    }
}
