use enigo::{Direction, Enigo, Key, Keyboard, Settings};
use tracing::debug;

use crate::error::MyError;

/** simulates the paste keystroke in whatever window has the focus */
pub trait PasteInjector {
 fn inject_paste(&mut self) -> Result<(), MyError>;
}

/** ctrl-v through enigo, created per paste so no virtual keyboard stays around */
#[derive(Default)]
pub struct EnigoInjector;

impl PasteInjector for EnigoInjector {
 fn inject_paste(&mut self) -> Result<(), MyError> {
  let mut enigo =
   Enigo::new(&Settings::default()).map_err(|err| MyError::Injection(format!("{err:?}")))?;
  let injection = |err| MyError::Injection(format!("{err:?}"));

  enigo.key(Key::Control, Direction::Press).map_err(injection)?;
  let clicked = enigo.key(Key::Unicode('v'), Direction::Click).map_err(injection);
  // release ctrl even when the click failed
  enigo.key(Key::Control, Direction::Release).map_err(injection)?;
  clicked?;

  debug!("paste keystroke injected");
  Ok(())
 }
}

/** counts the injections instead of typing, for tests and headless runs */
#[derive(Default, Debug)]
pub struct CountingInjector {
 pub injected: u32,
 pub fail: bool,
}

impl PasteInjector for CountingInjector {
 fn inject_paste(&mut self) -> Result<(), MyError> {
  if self.fail {
   return Err(MyError::Injection("no keyboard".into()));
  }
  self.injected += 1;
  Ok(())
 }
}
