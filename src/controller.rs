use std::time::Duration;
use tracing::trace;

use crate::domain::{Message, TVConfig, TVError};
use crate::model::Model;
use ratatui::crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};

pub struct Controller {
    event_poll_time: u64,
}

impl Controller {
    pub fn new(cfg: &TVConfig) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
        }
    }

    pub fn handle_event(&self, model: &Model) -> Result<Option<Message>, TVError> {
        if event::poll(Duration::from_millis(self.event_poll_time))?
            && let Event::Key(key) = event::read()?
            && key.kind == event::KeyEventKind::Press
        {
            return Ok(self.handle_key(key, model.raw_keyevents()));
        }
        Ok(None)
    }

    fn handle_key(&self, key: KeyEvent, raw: bool) -> Option<Message> {
        if raw {
            return Some(Message::RawKey(key));
        }
        let message = match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(Message::Quit),
            (KeyCode::Char('q'), _) => Some(Message::Quit),
            (KeyCode::Char('p') | KeyCode::PageUp | KeyCode::Left, _) => {
                Some(Message::PreviousPage)
            }
            (KeyCode::Char('n') | KeyCode::PageDown | KeyCode::Right, _) => {
                Some(Message::NextPage)
            }
            (KeyCode::Home, _) => Some(Message::FirstPage),
            (KeyCode::End, _) => Some(Message::LastPage),
            (KeyCode::Char('g') | KeyCode::Char(':'), _) => Some(Message::EnterPageJump),
            (KeyCode::Char('+'), _) => Some(Message::NextPageSize),
            (KeyCode::Char('-'), _) => Some(Message::PreviousPageSize),
            (KeyCode::Tab, _) => Some(Message::NextColumn),
            (KeyCode::BackTab, _) => Some(Message::PreviousColumn),
            (KeyCode::Char('s'), _) => Some(Message::ToggleSort),
            (KeyCode::Char('k') | KeyCode::Up, _) => Some(Message::MoveUp),
            (KeyCode::Char('j') | KeyCode::Down, _) => Some(Message::MoveDown),
            (KeyCode::Enter, _) => Some(Message::Activate),
            (KeyCode::Char('u'), _) => Some(Message::Update),
            (KeyCode::Char('d'), _) => Some(Message::Delete),
            (KeyCode::Char('y'), _) => Some(Message::CopyRow),
            (KeyCode::Char('c'), _) => Some(Message::CopyCell),
            (KeyCode::Char('r'), _) => Some(Message::Reload),
            (KeyCode::Char('?'), _) => Some(Message::Help),
            (KeyCode::Esc, _) => Some(Message::Exit),
            _ => None,
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> Controller {
        Controller::new(&TVConfig::default())
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn maps_navigation_keys() {
        let c = controller();
        assert_eq!(c.handle_key(press(KeyCode::Char('n')), false), Some(Message::NextPage));
        assert_eq!(c.handle_key(press(KeyCode::PageDown), false), Some(Message::NextPage));
        assert_eq!(c.handle_key(press(KeyCode::Char('p')), false), Some(Message::PreviousPage));
        assert_eq!(c.handle_key(press(KeyCode::Home), false), Some(Message::FirstPage));
        assert_eq!(c.handle_key(press(KeyCode::End), false), Some(Message::LastPage));
        assert_eq!(c.handle_key(press(KeyCode::Char('g')), false), Some(Message::EnterPageJump));
    }

    #[test]
    fn maps_table_keys() {
        let c = controller();
        assert_eq!(c.handle_key(press(KeyCode::Char('s')), false), Some(Message::ToggleSort));
        assert_eq!(c.handle_key(press(KeyCode::Tab), false), Some(Message::NextColumn));
        assert_eq!(c.handle_key(press(KeyCode::Char('u')), false), Some(Message::Update));
        assert_eq!(c.handle_key(press(KeyCode::Char('d')), false), Some(Message::Delete));
        assert_eq!(c.handle_key(press(KeyCode::Enter), false), Some(Message::Activate));
        assert_eq!(c.handle_key(press(KeyCode::Char('x')), false), None);
    }

    #[test]
    fn ctrl_c_quits_but_c_copies() {
        let c = controller();
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(c.handle_key(ctrl_c, false), Some(Message::Quit));
        assert_eq!(c.handle_key(press(KeyCode::Char('c')), false), Some(Message::CopyCell));
    }

    #[test]
    fn raw_mode_forwards_keys() {
        let c = controller();
        let key = press(KeyCode::Char('q'));
        assert_eq!(c.handle_key(key, true), Some(Message::RawKey(key)));
    }
}
