use std::time::Duration;

use chrono::TimeDelta;
use x11_clipboard as x11;

use x11::Atoms;
use x11::Clipboard;

use crate::error::ClipboardError;
use crate::tools::MyTime;

const READ_TIMEOUT: Duration = Duration::from_millis(500);
/** reads per clipboard change notification, the first failure is retried once */
pub const READ_ATTEMPTS: u32 = 2;
const ECHO_MARGIN: Duration = Duration::from_millis(500);

/** how long an own write may take to come back: every read attempt may run into its timeout */
pub fn echo_grace() -> TimeDelta {
 let grace = READ_TIMEOUT * READ_ATTEMPTS + ECHO_MARGIN;
 TimeDelta::milliseconds(grace.as_millis() as i64)
}

/** the operations the history needs from an OS clipboard */
pub trait ClipboardService {
 /** Ok(None) when the clipboard holds no text */
 fn read_text(&mut self) -> Result<Option<String>, ClipboardError>;
 fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/** the X11 CLIPBOARD selection ( ctrl-c/ctrl-v ) read and written as UTF8_STRING */
pub struct X11Clipboard {
 cb: Clipboard,
 atoms: Atoms,
}

impl X11Clipboard {
 pub fn new() -> Result<Self, ClipboardError> {
  let cb = Clipboard::new().map_err(|err| ClipboardError::Connect(format!("{err:?}")))?;
  let atoms = cb.setter.atoms.clone();
  Ok(Self { cb, atoms })
 }
}

impl ClipboardService for X11Clipboard {
 fn read_text(&mut self) -> Result<Option<String>, ClipboardError> {
  let atoms = &self.atoms;
  match self
   .cb
   .load(atoms.clipboard, atoms.utf8_string, atoms.property, READ_TIMEOUT)
  {
   Ok(bytes) if bytes.is_empty() => Ok(None),
   Ok(bytes) => Ok(Some(String::from_utf8_lossy(bytes.as_slice()).into())),
   Err(err) => Err(ClipboardError::Read(format!("{err:?}"))),
  }
 }

 fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
  let atoms = &self.atoms;
  self
   .cb
   .store(atoms.clipboard, atoms.utf8_string, text.as_bytes())
   .map_err(|err| ClipboardError::Write(format!("{err:?}")))
 }
}

/** in memory clipboard with scripted failures, used where no display is available */
#[derive(Debug, Default)]
pub struct MemoryClipboard {
 pub content: Option<String>,
 pub writes: Vec<String>,
 /** the next n reads fail */
 pub failing_reads: u32,
 pub failing_writes: bool,
 pub reads: u32,
}

impl MemoryClipboard {
 pub fn new() -> Self {
  Self::default()
 }
}

impl ClipboardService for MemoryClipboard {
 fn read_text(&mut self) -> Result<Option<String>, ClipboardError> {
  self.reads += 1;
  if self.failing_reads > 0 {
   self.failing_reads -= 1;
   return Err(ClipboardError::Read("clipboard is locked".into()));
  }
  Ok(self.content.clone().filter(|s| !s.is_empty()))
 }

 fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
  if self.failing_writes {
   return Err(ClipboardError::Write("clipboard is locked".into()));
  }
  self.content = Some(text.into());
  self.writes.push(text.into());
  Ok(())
 }
}

/** clipboard access for the controller, remembers its own writes so they are not captured again */
pub struct ClipboardBridge<C: ClipboardService> {
 service: C,
 self_write: Option<(MyTime, String)>,
 grace: TimeDelta,
}

impl<C: ClipboardService> ClipboardBridge<C> {
 pub fn new(service: C) -> Self {
  Self::with_grace(service, echo_grace())
 }

 pub fn with_grace(service: C, grace: TimeDelta) -> Self {
  Self {
   service,
   self_write: None,
   grace,
  }
 }

 pub fn read_text(&mut self) -> Result<Option<String>, ClipboardError> {
  self.service.read_text()
 }

 /** writes and tags the text as self originated */
 pub fn write_self(&mut self, text: &str) -> Result<(), ClipboardError> {
  self.service.write_text(text)?;
  self.self_write = Some((MyTime::now(), text.into()));
  Ok(())
 }

 /** consumes the tag of the last own write, true when `text` is its echo */
 pub fn take_echo(&mut self, text: &str) -> bool {
  match self.self_write.take() {
   Some((written_at, written)) if written_at.elapsed() <= self.grace => written == text,
   _ => false,
  }
 }

 pub fn has_pending_echo(&self) -> bool {
  self.self_write.is_some()
 }

 pub fn service(&self) -> &C {
  &self.service
 }

 pub fn service_mut(&mut self) -> &mut C {
  &mut self.service
 }
}

/** decides whether a poll of the clipboard shows a new value */
#[derive(Debug, Default)]
pub struct ChangeDetector {
 last_seen: Option<String>,
}

impl ChangeDetector {
 pub fn new() -> Self {
  Self { last_seen: None }
 }

 /** failed reads and non text content are no change */
 pub fn observe(&mut self, read: Result<Option<String>, ClipboardError>) -> Option<String> {
  match read {
   Ok(Some(text)) if self.last_seen.as_ref() != Some(&text) => {
    self.last_seen = Some(text.clone());
    Some(text)
   }
   _ => None,
  }
 }
}

#[cfg(test)]
mod tests {
 use chrono::TimeDelta;

 use crate::clipboards::{echo_grace, ChangeDetector, ClipboardBridge, ClipboardService, MemoryClipboard};
 use crate::error::ClipboardError;

 #[test]
 fn own_write_is_an_echo_exactly_once() {
  let mut bridge = ClipboardBridge::new(MemoryClipboard::new());
  bridge.write_self("pasted").unwrap();
  assert!(bridge.has_pending_echo());
  assert!(bridge.take_echo("pasted"));
  assert!(!bridge.take_echo("pasted"));
 }

 #[test]
 fn different_text_drops_the_tag() {
  let mut bridge = ClipboardBridge::new(MemoryClipboard::new());
  bridge.write_self("pasted").unwrap();
  assert!(!bridge.take_echo("copied elsewhere"));
  assert!(!bridge.has_pending_echo());
 }

 #[test]
 fn echo_grace_outlasts_both_reads() {
  assert!(echo_grace() > TimeDelta::milliseconds(1000));
  assert_eq!(echo_grace(), TimeDelta::milliseconds(1500));
 }

 #[test]
 fn expired_tag_is_no_echo() {
  let mut bridge = ClipboardBridge::with_grace(MemoryClipboard::new(), TimeDelta::milliseconds(-1));
  bridge.write_self("pasted").unwrap();
  assert!(!bridge.take_echo("pasted"));
 }

 #[test]
 fn failed_write_is_not_tagged() {
  let mut clipboard = MemoryClipboard::new();
  clipboard.failing_writes = true;
  let mut bridge = ClipboardBridge::new(clipboard);
  assert!(bridge.write_self("pasted").is_err());
  assert!(!bridge.has_pending_echo());
 }

 #[test]
 fn memory_clipboard_fails_the_scripted_reads() {
  let mut clipboard = MemoryClipboard::new();
  clipboard.content = Some("x".into());
  clipboard.failing_reads = 1;
  assert!(clipboard.read_text().is_err());
  assert_eq!(clipboard.read_text(), Ok(Some("x".into())));
 }

 #[test]
 fn detector_reports_each_new_value_once() {
  let mut detector = ChangeDetector::new();
  assert_eq!(detector.observe(Ok(Some("a".into()))), Some("a".into()));
  assert_eq!(detector.observe(Ok(Some("a".into()))), None);
  assert_eq!(detector.observe(Err(ClipboardError::Read("locked".into()))), None);
  assert_eq!(detector.observe(Ok(None)), None);
  assert_eq!(detector.observe(Ok(Some("b".into()))), Some("b".into()));
  assert_eq!(detector.observe(Ok(Some("a".into()))), Some("a".into()));
 }
}
