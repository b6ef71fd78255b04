use std::time::Instant;

use tracing::{debug, info, trace, warn};

use crate::clipboards::{ClipboardBridge, ClipboardService, READ_ATTEMPTS};
use crate::history::ClipHistory;
use crate::injector::PasteInjector;
use crate::observer::{Observer, Observers, Property, Value};
use crate::policy::PolicyConfig;
use crate::timer::PasteTimer;
use crate::tools::{retry_bounded, RetryOutcome};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControllerState {
 /** overlay hidden */
 Idle,
 /** overlay visible, history navigable */
 Browsing,
}

/** the discrete events the overlay sends back */
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverlayCommand {
 Next,
 Prev,
 Home,
 End,
 Delete,
 Paste,
 Cancel,
 FocusLost,
}

/** what became of a clipboard change notification */
#[derive(Clone, Debug, PartialEq)]
pub enum CopyOutcome {
 Added,
 /** equal to the most recent clip */
 Duplicate,
 /** our own paste coming back */
 Echo,
 NoText,
 Paused,
 /** both reads failed but the text is already in the history */
 AlreadyRecorded,
 Reported(String),
}

/** drives the history from hot key, clipboard, overlay and timer events */
pub struct InputController<C: ClipboardService, I: PasteInjector> {
 history: ClipHistory,
 policy: PolicyConfig,
 bridge: ClipboardBridge<C>,
 injector: I,
 timer: PasteTimer,
 state: ControllerState,
 just_pasted: bool,
 just_cancelled: bool,
 paused: bool,
 observers: Observers,
}

impl<C: ClipboardService, I: PasteInjector> InputController<C, I> {
 pub fn new(policy: PolicyConfig, bridge: ClipboardBridge<C>, injector: I) -> Self {
  Self {
   history: ClipHistory::new(policy.capacity),
   policy,
   bridge,
   injector,
   timer: PasteTimer::new(),
   state: ControllerState::Idle,
   just_pasted: false,
   just_cancelled: false,
   paused: false,
   observers: Observers::default(),
  }
 }

 pub fn subscribe(&mut self, observer: Box<dyn Observer>) {
  self.observers.subscribe(observer);
 }

 pub fn history(&self) -> &ClipHistory {
  &self.history
 }

 pub fn policy(&self) -> &PolicyConfig {
  &self.policy
 }

 pub fn state(&self) -> ControllerState {
  self.state
 }

 pub fn timer(&self) -> &PasteTimer {
  &self.timer
 }

 pub fn bridge(&self) -> &ClipboardBridge<C> {
  &self.bridge
 }

 pub fn bridge_mut(&mut self) -> &mut ClipboardBridge<C> {
  &mut self.bridge
 }

 pub fn injector(&self) -> &I {
  &self.injector
 }

 pub fn just_pasted(&self) -> bool {
  self.just_pasted
 }

 pub fn just_cancelled(&self) -> bool {
  self.just_cancelled
 }

 /** the watcher saw a new clipboard value, `observed` is what it read */
 pub fn on_clipboard_changed(&mut self, observed: Option<&str>) -> CopyOutcome {
  if self.paused {
   return CopyOutcome::Paused;
  }

  let history = &self.history;
  let bridge = &mut self.bridge;
  let outcome = retry_bounded(
   READ_ATTEMPTS,
   |attempt| {
    trace!(attempt, "reading clipboard");
    bridge.read_text()
   },
   || observed.is_some_and(|o| !o.is_empty() && o == history.most_recent_clip()),
  );

  let text = match outcome {
   RetryOutcome::Success(Some(text)) => text,
   RetryOutcome::Success(None) => return CopyOutcome::NoText,
   RetryOutcome::TransientFailure(err) => {
    debug!("clipboard read failed, text already recorded: {}", err);
    return CopyOutcome::AlreadyRecorded;
   }
   RetryOutcome::NeedsReport(err) => {
    let message = err.to_string();
    self.notice(&message);
    return CopyOutcome::Reported(message);
   }
  };

  // the own write tag is consumed by exactly this one notification
  if self.bridge.take_echo(&text) {
   trace!("ignoring own clipboard write");
   return CopyOutcome::Echo;
  }

  if text == self.history.most_recent_clip() {
   return CopyOutcome::Duplicate;
  }

  self.history.add_new_clip(text);
  self.history.reset();
  debug!(count = self.history.len(), "clip added");
  if self.state == ControllerState::Browsing {
   self.publish_clip();
  } else {
   self.publish_label();
  }
  CopyOutcome::Added
 }

 pub fn on_hotkey(&mut self, now: Instant) {
  match self.state {
   ControllerState::Idle => {
    self.just_pasted = false;
    self.just_cancelled = false;
    self.state = ControllerState::Browsing;
    debug!("browsing");
    self.publish_clip();
    self.observers.notify(Property::Visible, Value::Flag(true));
    self.timer.arm(now, self.policy.paste_timeout());
   }
   ControllerState::Browsing => {
    self.history.next();
    self.refresh(now);
   }
  }
 }

 pub fn on_overlay(&mut self, command: OverlayCommand, now: Instant) {
  if command != OverlayCommand::FocusLost && self.state != ControllerState::Browsing {
   trace!(?command, "ignored while idle");
   return;
  }

  match command {
   OverlayCommand::Next => self.history.next(),
   OverlayCommand::Prev => self.history.prev(),
   OverlayCommand::Home => self.history.reset(),
   OverlayCommand::End => self.history.go_to_end(),
   OverlayCommand::Delete => self.history.remove_current(),
   OverlayCommand::Paste => return self.paste(),
   OverlayCommand::Cancel => return self.cancel(),
   OverlayCommand::FocusLost => return self.on_focus_lost(),
  }
  self.refresh(now);
 }

 /** called by the event loop on every wake up, runs the auto paste when its time has come */
 pub fn on_tick(&mut self, now: Instant) -> bool {
  if self.state == ControllerState::Browsing && self.timer.fire_if_due(now) {
   debug!("paste timeout");
   self.paste();
   return true;
  }
  false
 }

 fn refresh(&mut self, now: Instant) {
  self.publish_clip();
  self.timer.arm(now, self.policy.paste_timeout());
 }

 fn paste(&mut self) {
  self.timer.cancel();

  if !self.history.is_empty() {
   let clip = self.history.current_clip().to_string();

   // ctrl+v would paste the stale clipboard content
   if let Err(err) = self.bridge.write_self(&clip) {
    self.notice(&err.to_string());
    self.just_pasted = true;
    self.hide();
    return;
   }

   if self.policy.move_to_front_on_paste {
    self.history.remove_current();
    self.history.add_new_clip(clip);
   }
   if self.policy.reset_on_paste {
    self.history.reset();
   }
  }

  self.just_pasted = true;
  self.hide();

  if !self.history.is_empty() {
   if let Err(err) = self.injector.inject_paste() {
    self.notice(&err.to_string());
   }
  }
  info!("pasted");
 }

 fn cancel(&mut self) {
  self.timer.cancel();
  if self.policy.reset_on_cancel {
   self.history.reset();
  }
  self.just_cancelled = true;
  self.hide();
 }

 fn on_focus_lost(&mut self) {
  // while idle only the focus loss right after a session counts, and it just ends that session
  if self.state == ControllerState::Idle {
   if self.just_pasted || self.just_cancelled {
    trace!("session end confirmed by focus loss");
   }
   self.just_pasted = false;
   self.just_cancelled = false;
   return;
  }

  if self.policy.reset_on_cancel && !self.just_pasted && !self.just_cancelled {
   self.history.reset();
  }
  self.timer.cancel();
  self.hide();
  self.just_pasted = false;
  self.just_cancelled = false;
 }

 fn hide(&mut self) {
  let was_browsing = self.state == ControllerState::Browsing;
  self.state = ControllerState::Idle;
  self.publish_label();
  if was_browsing {
   debug!("idle");
   self.observers.notify(Property::Visible, Value::Flag(false));
  }
 }

 pub fn toggle_pause(&mut self) -> bool {
  self.paused = !self.paused;
  info!(paused = self.paused, "capturing toggled");
  self
   .observers
   .notify(Property::Paused, Value::Flag(self.paused));
  self.paused
 }

 /** only while idle, a browsing session keeps its history */
 pub fn clear(&mut self) -> bool {
  if self.state != ControllerState::Idle {
   return false;
  }
  self.history.clear();
  self.publish_clip();
  true
 }

 /** takes over a new policy while idle, a smaller capacity drops the oldest clips */
 pub fn apply_policy(&mut self, policy: PolicyConfig) -> bool {
  if self.state != ControllerState::Idle {
   return false;
  }
  self.history.set_capacity(policy.capacity);
  self.policy = policy;
  info!(policy = ?self.policy, "policy applied");
  self.publish_label();
  true
 }

 pub fn notice(&mut self, message: &str) {
  warn!("{}", message);
  self
   .observers
   .notify(Property::Notice, Value::Text(message.to_string()));
 }

 fn publish_clip(&mut self) {
  let clip = self.history.current_clip().to_string();
  self.observers.notify(Property::CurrentClip, Value::Text(clip));
  self.publish_label();
 }

 fn publish_label(&mut self) {
  let label = self.history.label();
  self.observers.notify(Property::CurrentLabel, Value::Text(label));
 }
}
