use signal_hook::consts::{SIGINT, SIGTERM};
use termion::event::{Event, Key};

use std::{
 ffi::c_int,
 sync::{
  atomic::{AtomicBool, Ordering},
  mpsc::Sender,
  Arc,
 },
};

/** everything the producer threads hand over to the event loop */
#[derive(Clone, Debug, PartialEq)]
pub enum MyEvent {
 Termion(Event),
 SignalHook(c_int), // signal_hook didn't wrap that
 /** the global hot key was pressed */
 HotKey,
 /** focus gained (true) / lost (false) by the terminal showing the overlay */
 OverlayFocus(bool),
 /** the clipboard watcher saw this new text */
 ClipboardChanged(Option<String>),
}

impl MyEvent {
 pub fn is_stop_event(&self) -> bool {
  match self {
   MyEvent::Termion(tev) if tev == &Event::Key(Key::Char('x')) => true,
   // both is possible
   MyEvent::Termion(tev) if tev == &Event::Key(Key::Ctrl('c')) => true,
   MyEvent::SignalHook(shev) if shev == &SIGINT || shev == &SIGTERM => true,
   _ => false,
  }
 }
}

/** shared between the event loop and the producer threads, set once on shutdown */
#[derive(Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
 pub fn new() -> Self {
  Self(Arc::new(AtomicBool::new(false)))
 }

 pub fn stop(&self) {
  self.0.store(true, Ordering::SeqCst);
 }

 pub fn get_stop_threads(&self) -> bool {
  self.0.load(Ordering::SeqCst)
 }
}

/** sends into the event loop, a closed loop stops the producer */
pub fn push_event(tx: &Sender<MyEvent>, stop: &StopFlag, event: MyEvent) -> bool {
 if tx.send(event).is_err() {
  stop.stop();
  return false;
 }
 true
}
