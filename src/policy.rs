use std::time::Duration;

pub const DEFAULT_CAPACITY: usize = 40;
pub const DEFAULT_RESET_ON_PASTE: bool = true;
pub const DEFAULT_RESET_ON_CANCEL: bool = false;
pub const DEFAULT_PASTE_TIMEOUT_SECONDS: f64 = 2.0;
pub const DEFAULT_MOVE_TO_FRONT_ON_PASTE: bool = false;

pub const MAX_CAPACITY: usize = 256;
pub const MAX_PASTE_TIMEOUT_SECONDS: f64 = 600.0;

/** behaviour switches read by the controller, replaced as a whole when the store is applied */
#[derive(Clone, Debug, PartialEq)]
pub struct PolicyConfig {
 pub capacity: usize,
 pub reset_on_paste: bool,
 pub reset_on_cancel: bool,
 pub paste_timeout_ms: i64,
 pub move_to_front_on_paste: bool,
}

impl Default for PolicyConfig {
 fn default() -> Self {
  Self {
   capacity: DEFAULT_CAPACITY,
   reset_on_paste: DEFAULT_RESET_ON_PASTE,
   reset_on_cancel: DEFAULT_RESET_ON_CANCEL,
   paste_timeout_ms: timeout_ms_from_seconds(DEFAULT_PASTE_TIMEOUT_SECONDS),
   move_to_front_on_paste: DEFAULT_MOVE_TO_FRONT_ON_PASTE,
  }
 }
}

impl PolicyConfig {
 /** None when auto paste is switched off */
 pub fn paste_timeout(&self) -> Option<Duration> {
  if self.paste_timeout_ms <= 0 {
   None
  } else {
   Some(Duration::from_millis(self.paste_timeout_ms as u64))
  }
 }
}

pub fn timeout_ms_from_seconds(seconds: f64) -> i64 {
 (seconds * 1000.0).floor() as i64
}
