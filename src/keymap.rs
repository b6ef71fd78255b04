use termion::event::{Event, Key};

use crate::controller::{ControllerState, OverlayCommand};

/** what a key press in the overlay terminal asks for */
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyAction {
 Overlay(OverlayCommand),
 Help,
 Clear,
 Pause,
 Reload,
 /** leaves the help page */
 Quit,
 ScrollUp,
 ScrollDown,
 Unbound,
}

pub fn map_key(event: &Event, state: ControllerState, help_shown: bool) -> KeyAction {
 let Event::Key(key) = event else {
  return KeyAction::Unbound;
 };

 if help_shown {
  return match key {
   Key::Char('q') | Key::Esc => KeyAction::Quit,
   Key::Up => KeyAction::ScrollUp,
   Key::Down => KeyAction::ScrollDown,
   _ => KeyAction::Unbound,
  };
 }

 match state {
  ControllerState::Browsing => match key {
   Key::Right | Key::Down | Key::Char('\t') | Key::Char('v') => KeyAction::Overlay(OverlayCommand::Next),
   Key::Left | Key::Up | Key::BackTab => KeyAction::Overlay(OverlayCommand::Prev),
   Key::Home => KeyAction::Overlay(OverlayCommand::Home),
   Key::End => KeyAction::Overlay(OverlayCommand::End),
   Key::Delete | Key::Char('d') => KeyAction::Overlay(OverlayCommand::Delete),
   Key::Char('\n') => KeyAction::Overlay(OverlayCommand::Paste),
   Key::Esc => KeyAction::Overlay(OverlayCommand::Cancel),
   _ => KeyAction::Unbound,
  },
  ControllerState::Idle => match key {
   Key::Char('h') => KeyAction::Help,
   Key::Char('c') => KeyAction::Clear,
   Key::Char('p') => KeyAction::Pause,
   Key::Char('r') => KeyAction::Reload,
   _ => KeyAction::Unbound,
  },
 }
}

#[cfg(test)]
mod tests {
 use termion::event::{Event, Key, MouseButton, MouseEvent};

 use crate::controller::{ControllerState, OverlayCommand};
 use crate::keymap::{map_key, KeyAction};

 fn browsing(key: Key) -> KeyAction {
  map_key(&Event::Key(key), ControllerState::Browsing, false)
 }

 #[test]
 fn browsing_keys() {
  assert_eq!(browsing(Key::Char('\t')), KeyAction::Overlay(OverlayCommand::Next));
  assert_eq!(browsing(Key::Char('v')), KeyAction::Overlay(OverlayCommand::Next));
  assert_eq!(browsing(Key::Left), KeyAction::Overlay(OverlayCommand::Prev));
  assert_eq!(browsing(Key::End), KeyAction::Overlay(OverlayCommand::End));
  assert_eq!(browsing(Key::Delete), KeyAction::Overlay(OverlayCommand::Delete));
  assert_eq!(browsing(Key::Char('\n')), KeyAction::Overlay(OverlayCommand::Paste));
  assert_eq!(browsing(Key::Esc), KeyAction::Overlay(OverlayCommand::Cancel));
  assert_eq!(browsing(Key::Char('h')), KeyAction::Unbound);
 }

 #[test]
 fn idle_keys() {
  let idle = |key| map_key(&Event::Key(key), ControllerState::Idle, false);
  assert_eq!(idle(Key::Char('h')), KeyAction::Help);
  assert_eq!(idle(Key::Char('r')), KeyAction::Reload);
  assert_eq!(idle(Key::Right), KeyAction::Unbound);
 }

 #[test]
 fn help_page_keys_win() {
  assert_eq!(map_key(&Event::Key(Key::Esc), ControllerState::Browsing, true), KeyAction::Quit);
  assert_eq!(map_key(&Event::Key(Key::Down), ControllerState::Idle, true), KeyAction::ScrollDown);
 }

 #[test]
 fn mouse_is_unbound() {
  let click = Event::Mouse(MouseEvent::Press(MouseButton::Left, 1, 1));
  assert_eq!(map_key(&click, ControllerState::Browsing, false), KeyAction::Unbound);
 }
}
