use std::{fs::OpenOptions, path::Path, sync::Mutex};

use tracing::trace;
use tracing_subscriber::EnvFilter;

use crate::error::MyError;

/** logs go to a file, the terminal belongs to the overlay; RUST_LOG overrides the level */
pub fn init_logging(log_file: &Path, debug: bool) -> Result<(), MyError> {
 let file = OpenOptions::new()
  .create(true)
  .append(true)
  .open(log_file)
  .map_err(|err| MyError::Config {
   path: log_file.display().to_string(),
   reason: err.to_string(),
  })?;

 let default_level = if debug { "trace" } else { "info" };
 let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

 // a second init (tests) keeps the first subscriber
 let _ = tracing_subscriber::fmt()
  .with_env_filter(env_filter)
  .with_ansi(false)
  .with_writer(Mutex::new(file))
  .try_init();
 Ok(())
}

/** marks a startup or shutdown stage in the log */
pub fn monitor(stage: &str) {
 trace!(stage, "monitor");
}
