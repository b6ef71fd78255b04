use std::fmt::Display;

use chrono::DateTime;
use chrono::Local;
use chrono::TimeDelta;

#[derive(Clone, PartialEq, Debug, PartialOrd, Eq, Ord)]
pub struct MyTime {
 pub timestamp: DateTime<Local>,
}

impl Display for MyTime {
 fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
  self.timestamp.fmt(f)
 }
}

impl MyTime {
 pub fn now() -> Self {
  Self {
   timestamp: Local::now(),
  }
 }

 pub fn elapsed(&self) -> TimeDelta {
  Local::now() - self.timestamp
 }

 pub fn get_time(&self) -> String {
  self.timestamp.format("%H:%M:%S").to_string()
 }
}

/** result of [retry_bounded] */
#[derive(Debug, PartialEq)]
pub enum RetryOutcome<T, E> {
 Success(T),
 /** all attempts failed but the caller found its goal reached anyway */
 TransientFailure(E),
 NeedsReport(E),
}

/** runs `attempt` up to `max_attempts` times, `already_satisfied` decides about the last error */
pub fn retry_bounded<T, E>(
 max_attempts: u32,
 mut attempt: impl FnMut(u32) -> Result<T, E>,
 already_satisfied: impl FnOnce() -> bool,
) -> RetryOutcome<T, E> {
 let max_attempts = max_attempts.max(1);
 let mut n = 1;
 loop {
  match attempt(n) {
   Ok(value) => return RetryOutcome::Success(value),
   Err(err) if n >= max_attempts => {
    return if already_satisfied() {
     RetryOutcome::TransientFailure(err)
    } else {
     RetryOutcome::NeedsReport(err)
    };
   }
   Err(_) => n += 1,
  }
 }
}

pub fn flatline(string: &str) -> String {
 string.replace("\n", " ") // lcibiwnao0
}
