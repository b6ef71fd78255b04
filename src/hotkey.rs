use std::{
 fmt::Display,
 str::FromStr,
 sync::{mpsc::Sender, Arc},
 thread::{self, JoinHandle},
};

use tracing::{debug, trace, warn};
use xcb_1::{x, Connection, Xid};

use crate::config::sleep_default;
use crate::error::MyError;
use crate::event::{push_event, MyEvent, StopFlag};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HotkeyKey {
 Char(char),
 F(u8),
 Space,
 Insert,
}

impl HotkeyKey {
 /** the X11 keysym, latin letters and digits map onto themselves */
 pub fn keysym(&self) -> u32 {
  match self {
   HotkeyKey::Char(c) => c.to_ascii_lowercase() as u32,
   HotkeyKey::F(n) => 0xffbe + (*n as u32 - 1),
   HotkeyKey::Space => 0x20,
   HotkeyKey::Insert => 0xff63,
  }
 }
}

/** a global hot key like ctrl+shift+v */
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hotkey {
 pub ctrl: bool,
 pub shift: bool,
 pub alt: bool,
 pub logo: bool,
 pub key: HotkeyKey,
}

impl FromStr for Hotkey {
 type Err = MyError;

 fn from_str(s: &str) -> Result<Self, Self::Err> {
  let err = || MyError::HotkeyParse(s.to_string());
  let lower = s.to_lowercase();
  let mut parts: Vec<&str> = lower.split('+').map(str::trim).collect();
  let key = parts.pop().filter(|k| !k.is_empty()).ok_or_else(err)?;

  let mut hotkey = Hotkey {
   ctrl: false,
   shift: false,
   alt: false,
   logo: false,
   key: parse_key(key).ok_or_else(err)?,
  };

  for part in parts {
   match part {
    "ctrl" | "control" => hotkey.ctrl = true,
    "shift" => hotkey.shift = true,
    "alt" => hotkey.alt = true,
    "super" | "win" | "logo" => hotkey.logo = true,
    _ => return Err(err()),
   }
  }
  Ok(hotkey)
 }
}

fn parse_key(key: &str) -> Option<HotkeyKey> {
 match key {
  "space" => return Some(HotkeyKey::Space),
  "insert" | "ins" => return Some(HotkeyKey::Insert),
  _ => {}
 }
 if let Some(n) = key.strip_prefix('f').and_then(|n| n.parse::<u8>().ok()) {
  return (1..=12).contains(&n).then_some(HotkeyKey::F(n));
 }
 let mut chars = key.chars();
 match (chars.next(), chars.next()) {
  (Some(c), None) if c.is_ascii_alphanumeric() => Some(HotkeyKey::Char(c)),
  _ => None,
 }
}

impl Display for Hotkey {
 fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
  let mut parts = vec![];
  if self.ctrl {
   parts.push("ctrl".to_string());
  }
  if self.shift {
   parts.push("shift".to_string());
  }
  if self.alt {
   parts.push("alt".to_string());
  }
  if self.logo {
   parts.push("super".to_string());
  }
  parts.push(match self.key {
   HotkeyKey::Char(c) => c.to_string(),
   HotkeyKey::F(n) => format!("f{n}"),
   HotkeyKey::Space => "space".to_string(),
   HotkeyKey::Insert => "insert".to_string(),
  });
  write!(f, "{}", parts.join("+"))
 }
}

pub trait HotkeyService {
 fn register(&mut self, hotkey: &Hotkey) -> bool;
 fn unregister(&mut self);
}

/** registers until it works or `ask_retry` gives up */
pub fn register_with_retry(
 service: &mut dyn HotkeyService,
 hotkey: &Hotkey,
 mut ask_retry: impl FnMut(&Hotkey) -> bool,
) -> Result<(), MyError> {
 loop {
  if service.register(hotkey) {
   debug!(%hotkey, "hot key registered");
   return Ok(());
  }
  warn!(%hotkey, "hot key registration failed");
  if !ask_retry(hotkey) {
   return Err(MyError::HotkeyRegistration(hotkey.to_string()));
  }
 }
}

fn lock_variants() -> [x::ModMask; 4] {
 // CapsLock and NumLock must not disable the hot key
 [
  x::ModMask::empty(),
  x::ModMask::LOCK,
  x::ModMask::N2,
  x::ModMask::LOCK | x::ModMask::N2,
 ]
}

fn x11_modifiers(hotkey: &Hotkey) -> x::ModMask {
 let mut mask = x::ModMask::empty();
 if hotkey.ctrl {
  mask |= x::ModMask::CONTROL;
 }
 if hotkey.shift {
  mask |= x::ModMask::SHIFT;
 }
 if hotkey.alt {
  mask |= x::ModMask::N1;
 }
 if hotkey.logo {
  mask |= x::ModMask::N4;
 }
 mask
}

/** passive key grab on the X11 root window */
pub struct X11Hotkeys {
 conn: Arc<Connection>,
 root: x::Window,
 grabbed: Option<(x::Keycode, x::ModMask)>,
}

impl X11Hotkeys {
 pub fn connect() -> Result<Self, MyError> {
  let (conn, preferred_screen) = Connection::connect(None)?;
  let root = conn
   .get_setup()
   .roots()
   .nth(preferred_screen as usize)
   .ok_or_else(|| MyError::X11(format!("no screen {preferred_screen}")))?
   .root();
  Ok(Self {
   conn: Arc::new(conn),
   root,
   grabbed: None,
  })
 }

 pub fn connection(&self) -> Arc<Connection> {
  self.conn.clone()
 }

 fn keycode_of(&self, keysym: u32) -> Option<x::Keycode> {
  let setup = self.conn.get_setup();
  let min = setup.min_keycode();
  let max = setup.max_keycode();
  let cookie = self.conn.send_request(&x::GetKeyboardMapping {
   first_keycode: min,
   count: max - min + 1,
  });
  let reply = self.conn.wait_for_reply(cookie).ok()?;
  let per_keycode = reply.keysyms_per_keycode() as usize;
  if per_keycode == 0 {
   return None;
  }
  reply
   .keysyms()
   .chunks(per_keycode)
   .position(|syms| syms.contains(&keysym))
   .map(|idx| min + idx as u8)
 }

 fn ungrab(&self, keycode: x::Keycode, modifiers: x::ModMask) {
  for variant in lock_variants() {
   self.conn.send_request(&x::UngrabKey {
    key: keycode,
    grab_window: self.root,
    modifiers: modifiers | variant,
   });
  }
  let _ = self.conn.flush();
 }
}

impl HotkeyService for X11Hotkeys {
 fn register(&mut self, hotkey: &Hotkey) -> bool {
  self.unregister();

  let Some(keycode) = self.keycode_of(hotkey.key.keysym()) else {
   warn!(%hotkey, "no keycode for the hot key");
   return false;
  };
  let modifiers = x11_modifiers(hotkey);

  for variant in lock_variants() {
   let grabbed = self.conn.send_and_check_request(&x::GrabKey {
    owner_events: false,
    grab_window: self.root,
    modifiers: modifiers | variant,
    key: keycode,
    pointer_mode: x::GrabMode::Async,
    keyboard_mode: x::GrabMode::Async,
   });
   if let Err(err) = grabbed {
    // usually BadAccess: another client holds the combination
    warn!(%hotkey, "grab failed: {:?}", err);
    self.ungrab(keycode, modifiers);
    return false;
   }
  }

  self.grabbed = Some((keycode, modifiers));
  true
 }

 fn unregister(&mut self) {
  if let Some((keycode, modifiers)) = self.grabbed.take() {
   self.ungrab(keycode, modifiers);
  }
 }
}

impl Drop for X11Hotkeys {
 fn drop(&mut self) {
  self.unregister();
 }
}

/** X11 sends auto repeat as release/press pairs with the same timestamp */
#[derive(Debug, Default)]
pub struct RepeatFilter {
 last_release: Option<x::Timestamp>,
}

impl RepeatFilter {
 /** true for a real key press */
 pub fn press(&mut self, time: x::Timestamp) -> bool {
  self.last_release.take() != Some(time)
 }

 pub fn release(&mut self, time: x::Timestamp) {
  self.last_release = Some(time);
 }
}

/** tells whether the terminal window showing the overlay has the input focus */
#[derive(Debug)]
pub struct FocusTracker {
 overlay_window: u32,
 focused: Option<bool>,
}

impl FocusTracker {
 pub fn new(overlay_window: u32) -> Self {
  Self {
   overlay_window,
   focused: None,
  }
 }

 /** the first observation only sets the baseline */
 pub fn observe(&mut self, focus_window: u32) -> Option<bool> {
  let now = focus_window == self.overlay_window;
  let previous = self.focused.replace(now);
  match previous {
   Some(before) if before != now => Some(now),
   _ => None,
  }
 }
}

/** the terminal emulator's window, most X11 terminals export it */
pub fn overlay_window_from_env() -> Option<u32> {
 std::env::var("WINDOWID").ok()?.trim().parse().ok()
}

/** waits for hot key presses and focus changes and sends them to the event loop */
pub struct HotkeyThread {
 conn: Arc<Connection>,
 focus: Option<FocusTracker>,
}

impl HotkeyThread {
 pub fn new(conn: Arc<Connection>, overlay_window: Option<u32>) -> Self {
  Self {
   conn,
   focus: overlay_window.map(FocusTracker::new),
  }
 }

 pub fn run(mut self, tx: Sender<MyEvent>, stop: StopFlag) -> JoinHandle<()> {
  thread::spawn(move || {
   let mut repeat = RepeatFilter::default();

   'outer: loop {
    if stop.get_stop_threads() {
     break;
    }

    loop {
     match self.conn.poll_for_event() {
      Ok(Some(xcb_1::Event::X(x::Event::KeyPress(ev)))) => {
       if repeat.press(ev.time()) {
        trace!("hot key press");
        if !push_event(&tx, &stop, MyEvent::HotKey) {
         break 'outer;
        }
       }
      }
      Ok(Some(xcb_1::Event::X(x::Event::KeyRelease(ev)))) => repeat.release(ev.time()),
      Ok(Some(_)) => {}
      Ok(None) => break,
      Err(err) => {
       warn!("x11 connection lost: {:?}", err);
       break 'outer;
      }
     }
    }

    if let Some(tracker) = self.focus.as_mut() {
     let cookie = self.conn.send_request(&x::GetInputFocus {});
     if let Ok(reply) = self.conn.wait_for_reply(cookie) {
      if let Some(focused) = tracker.observe(reply.focus().resource_id()) {
       if !push_event(&tx, &stop, MyEvent::OverlayFocus(focused)) {
        break;
       }
      }
     }
    }

    sleep_default();
   }
  })
 }
}

#[cfg(test)]
mod tests {
 use crate::hotkey::{register_with_retry, FocusTracker, Hotkey, HotkeyKey, HotkeyService, RepeatFilter};

 #[test]
 fn parse_the_default_hotkey() {
  let hotkey: Hotkey = "ctrl+shift+v".parse().unwrap();
  assert!(hotkey.ctrl && hotkey.shift && !hotkey.alt && !hotkey.logo);
  assert_eq!(hotkey.key, HotkeyKey::Char('v'));
  assert_eq!(hotkey.to_string(), "ctrl+shift+v");
 }

 #[test]
 fn parse_named_keys() {
  let hotkey: Hotkey = "Super + F12".parse().unwrap();
  assert!(hotkey.logo);
  assert_eq!(hotkey.key, HotkeyKey::F(12));
  assert_eq!(hotkey.key.keysym(), 0xffc9);
  assert_eq!("alt+insert".parse::<Hotkey>().unwrap().key, HotkeyKey::Insert);
  assert_eq!("ctrl+V".parse::<Hotkey>().unwrap().key.keysym(), 'v' as u32);
 }

 #[test]
 fn reject_unknown_parts() {
  assert!("hyper+v".parse::<Hotkey>().is_err());
  assert!("ctrl+".parse::<Hotkey>().is_err());
  assert!("ctrl+f13".parse::<Hotkey>().is_err());
  assert!("ctrl+vv".parse::<Hotkey>().is_err());
 }

 struct FailingTimes(u32);

 impl HotkeyService for FailingTimes {
  fn register(&mut self, _hotkey: &Hotkey) -> bool {
   if self.0 == 0 {
    return true;
   }
   self.0 -= 1;
   false
  }
  fn unregister(&mut self) {}
 }

 #[test]
 fn retry_until_registered() {
  let hotkey: Hotkey = "ctrl+shift+v".parse().unwrap();
  let mut asked = 0;
  let result = register_with_retry(&mut FailingTimes(2), &hotkey, |_| {
   asked += 1;
   true
  });
  assert!(result.is_ok());
  assert_eq!(asked, 2);
 }

 #[test]
 fn declined_retry_is_fatal() {
  let hotkey: Hotkey = "ctrl+shift+v".parse().unwrap();
  assert!(register_with_retry(&mut FailingTimes(1), &hotkey, |_| false).is_err());
 }

 #[test]
 fn auto_repeat_is_filtered() {
  let mut filter = RepeatFilter::default();
  assert!(filter.press(100));
  filter.release(250);
  assert!(!filter.press(250));
  filter.release(900);
  assert!(filter.press(1400));
 }

 #[test]
 fn focus_changes_after_the_baseline() {
  let mut tracker = FocusTracker::new(42);
  assert_eq!(tracker.observe(7), None);
  assert_eq!(tracker.observe(42), Some(true));
  assert_eq!(tracker.observe(42), None);
  assert_eq!(tracker.observe(7), Some(false));
 }
}
