use std::time::{Duration, Instant};

/** auto paste countdown, polled by the event loop which owns the history */
#[derive(Debug, Default)]
pub struct PasteTimer {
 deadline: Option<Instant>,
}

impl PasteTimer {
 pub fn new() -> Self {
  Self { deadline: None }
 }

 /** (re)starts the countdown, a disabled timeout only cancels */
 pub fn arm(&mut self, now: Instant, timeout: Option<Duration>) {
  self.deadline = timeout.map(|t| now + t);
 }

 pub fn cancel(&mut self) {
  self.deadline = None;
 }

 pub fn is_armed(&self) -> bool {
  self.deadline.is_some()
 }

 pub fn deadline(&self) -> Option<Instant> {
  self.deadline
 }

 /** true once per countdown, when the deadline has passed */
 pub fn fire_if_due(&mut self, now: Instant) -> bool {
  match self.deadline {
   Some(deadline) if now >= deadline => {
    self.deadline = None;
    true
   }
   _ => false,
  }
 }
}
