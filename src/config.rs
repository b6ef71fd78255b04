use std::{
 fs,
 path::{Path, PathBuf},
 thread,
 time::Duration,
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{info, warn};

use crate::error::MyError;
use crate::hotkey::Hotkey;
use crate::libmain::Args;
use crate::policy::{self, timeout_ms_from_seconds, PolicyConfig};
use crate::preferences;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30);

pub const DEFAULT_CONFIG_FILE: &str = ".clipcycle.json";
pub const DEFAULT_LOG_FILE: &str = "clipcycle.log";
pub const DEFAULT_HOTKEY: &str = "ctrl+shift+v";

pub const USAGE: &str = r"

clipcycle [--debug] [--config FILE] [--hotkey ctrl+shift+v] [--log-file FILE]
clipcycle prefs [--capacity N] [--paste-timeout SECONDS] [--auto-paste BOOL]
                [--reset-on-paste BOOL] [--reset-on-cancel BOOL]
                [--move-to-front BOOL] [--restore-defaults]

- runs in a terminal window, which shows the browsed clip
- captures every text copied to the X11 clipboard
- the hot key shows the most recent clip, pressing it again cycles
- the shown clip is pasted when the paste timeout runs out

- Keys while browsing:

 next ..... Right, Down, Tab, v
 previous . Left, Up
 first .... Home
 last ..... End
 delete ... Delete, d
 paste .... Enter
 cancel ... Esc

- Keys while idle:

 (h)elp ... this screen
 (c)lear .. forgets all clips
 (p)ause .. stops / resumes capturing
 (r)eload . applies the settings file
 (q)uit ... leaves a screen
 e(x)it ... exits the program
 Ctrl-C ... exits the program

This software is licensed under the terms of the Apache-2.0 license. ";

pub fn sleep_default() {
 thread::sleep(DEFAULT_TIMEOUT);
}

#[derive(Clone, Debug)]
pub struct Config {
 pub debug: bool,
 pub config_path: PathBuf,
 pub log_file: PathBuf,
 pub hotkey: Hotkey,
}

impl Config {
 pub fn from_args(args: &Args) -> Result<Self, MyError> {
  Ok(Self {
   debug: args.debug,
   config_path: args.config.clone(),
   log_file: args.log_file.clone(),
   hotkey: args.hotkey.parse()?,
  })
 }
}

/** the settings file, camelCase keys; the snake_case keys of older files are accepted too */
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoredSettings {
 #[serde(
  alias = "save_count",
  deserialize_with = "number_or_string",
  serialize_with = "whole_as_integer"
 )]
 pub capacity: f64,
 #[serde(alias = "reset_on_paste")]
 pub reset_on_paste: bool,
 #[serde(alias = "reset_on_cancel")]
 pub reset_on_cancel: bool,
 #[serde(
  alias = "paste_timeout",
  deserialize_with = "number_or_string",
  serialize_with = "whole_as_integer"
 )]
 pub paste_timeout_seconds: f64,
 #[serde(alias = "move_pasted_to_front")]
 pub move_to_front_on_paste: bool,
}

impl Default for StoredSettings {
 fn default() -> Self {
  Self {
   capacity: policy::DEFAULT_CAPACITY as f64,
   reset_on_paste: policy::DEFAULT_RESET_ON_PASTE,
   reset_on_cancel: policy::DEFAULT_RESET_ON_CANCEL,
   paste_timeout_seconds: policy::DEFAULT_PASTE_TIMEOUT_SECONDS,
   move_to_front_on_paste: policy::DEFAULT_MOVE_TO_FRONT_ON_PASTE,
  }
 }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
 Number(f64),
 String(String),
}

// "40" and 40 are both fine
fn number_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
 match NumberOrString::deserialize(deserializer)? {
  NumberOrString::Number(n) => Ok(n),
  NumberOrString::String(s) => s.trim().parse().map_err(serde::de::Error::custom),
 }
}

fn whole_as_integer<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
 if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
  serializer.serialize_i64(*value as i64)
 } else {
  serializer.serialize_f64(*value)
 }
}

impl StoredSettings {
 /** the policy of these settings, invalid fields fall back to their default and are listed */
 pub fn to_policy(&self) -> (PolicyConfig, Vec<String>) {
  let mut policy = PolicyConfig {
   reset_on_paste: self.reset_on_paste,
   reset_on_cancel: self.reset_on_cancel,
   move_to_front_on_paste: self.move_to_front_on_paste,
   ..PolicyConfig::default()
  };
  let mut problems = vec![];

  match preferences::check_capacity(self.capacity) {
   Ok(capacity) => policy.capacity = capacity,
   Err(err) => problems.push(format!("capacity {}: {}", self.capacity, err)),
  }

  // a negative timeout is how a switched off auto paste is stored
  if self.paste_timeout_seconds < 0.0 {
   policy.paste_timeout_ms = -1;
  } else {
   match preferences::check_paste_timeout(self.paste_timeout_seconds) {
    Ok(seconds) => policy.paste_timeout_ms = timeout_ms_from_seconds(seconds),
    Err(err) => problems.push(format!(
     "pasteTimeoutSeconds {}: {}",
     self.paste_timeout_seconds, err
    )),
   }
  }

  (policy, problems)
 }
}

/** what loading the store produced, warnings are shown but never fatal */
#[derive(Debug)]
pub struct Loaded {
 pub settings: StoredSettings,
 pub policy: PolicyConfig,
 pub warnings: Vec<String>,
}

/** the JSON settings file */
#[derive(Clone, Debug)]
pub struct ConfigStore {
 path: PathBuf,
}

impl ConfigStore {
 pub fn new(path: impl Into<PathBuf>) -> Self {
  Self { path: path.into() }
 }

 pub fn path(&self) -> &Path {
  &self.path
 }

 /** a missing file is created with the defaults, a broken one is left alone */
 pub fn load(&self) -> Loaded {
  let mut warnings = vec![];

  let settings = if !self.path.exists() {
   info!(path = %self.path.display(), "creating settings file with defaults");
   let defaults = StoredSettings::default();
   if let Err(err) = self.save(&defaults) {
    warnings.push(err.to_string());
   }
   defaults
  } else {
   match self.read() {
    Ok(settings) => settings,
    Err(err) => {
     warnings.push(format!(
      "{}. If editing the file manually, make sure it is valid JSON. Falling back to default options.",
      err
     ));
     StoredSettings::default()
    }
   }
  };

  let (policy, problems) = settings.to_policy();
  warnings.extend(problems);

  for warning in &warnings {
   warn!("{}", warning);
  }

  Loaded {
   settings,
   policy,
   warnings,
  }
 }

 pub fn read(&self) -> Result<StoredSettings, MyError> {
  let text = fs::read_to_string(&self.path).map_err(|err| self.error(err))?;
  serde_json::from_str(&text).map_err(|err| self.error(err))
 }

 pub fn save(&self, settings: &StoredSettings) -> Result<(), MyError> {
  let text = serde_json::to_string_pretty(settings).map_err(|err| self.error(err))?;
  if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
   fs::create_dir_all(parent).map_err(|err| self.error(err))?;
  }
  fs::write(&self.path, text).map_err(|err| self.error(err))
 }

 fn error(&self, reason: impl ToString) -> MyError {
  MyError::Config {
   path: self.path.display().to_string(),
   reason: reason.to_string(),
  }
 }
}
