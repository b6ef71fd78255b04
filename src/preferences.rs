use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::config::StoredSettings;
use crate::policy::{MAX_CAPACITY, MAX_PASTE_TIMEOUT_SECONDS};

static WHOLE_NUMBER: LazyLock<Regex> =
 LazyLock::new(|| Regex::new(r"^[+-]?\d+$").expect("valid whole number regex"));
static SECONDS: LazyLock<Regex> =
 LazyLock::new(|| Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)$").expect("valid seconds regex"));
static SECONDS_PRECISION: LazyLock<Regex> =
 LazyLock::new(|| Regex::new(r"^[+-]?\d*(\.\d{0,3})?$").expect("valid seconds precision regex"));

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PrefError {
 #[error("Must Enter a Whole Number!")]
 NotWhole,
 #[error("Save Count Must be Positive!")]
 CapacityNotPositive,
 #[error("Save Count Too High!")]
 CapacityTooHigh,
 #[error("Must Enter a Number!")]
 NotNumber,
 #[error("Paste Timeout Must be Positive!")]
 TimeoutNegative,
 #[error("Paste Timeout Too High!")]
 TimeoutTooHigh,
 #[error("Paste Timeout Allows at Most 3 Decimal Places!")]
 TimeoutTooPrecise,
}

pub fn check_capacity(value: f64) -> Result<usize, PrefError> {
 if !value.is_finite() || value.fract() != 0.0 {
  return Err(PrefError::NotWhole);
 }
 if value < 1.0 {
  return Err(PrefError::CapacityNotPositive);
 }
 if value > MAX_CAPACITY as f64 {
  return Err(PrefError::CapacityTooHigh);
 }
 Ok(value as usize)
}

pub fn check_paste_timeout(seconds: f64) -> Result<f64, PrefError> {
 if !seconds.is_finite() {
  return Err(PrefError::NotNumber);
 }
 if seconds < 0.0 {
  return Err(PrefError::TimeoutNegative);
 }
 if seconds > MAX_PASTE_TIMEOUT_SECONDS {
  return Err(PrefError::TimeoutTooHigh);
 }
 Ok(seconds)
}

pub fn parse_capacity(input: &str) -> Result<usize, PrefError> {
 let input = input.trim();
 if !WHOLE_NUMBER.is_match(input) {
  return Err(PrefError::NotWhole);
 }
 let value: f64 = input.parse().map_err(|_| PrefError::NotWhole)?;
 check_capacity(value)
}

pub fn parse_paste_timeout(input: &str) -> Result<f64, PrefError> {
 let input = input.trim();
 if !SECONDS.is_match(input) {
  return Err(PrefError::NotNumber);
 }
 if !SECONDS_PRECISION.is_match(input) {
  return Err(PrefError::TimeoutTooPrecise);
 }
 let seconds: f64 = input.parse().map_err(|_| PrefError::NotNumber)?;
 check_paste_timeout(seconds)
}

/** the edits the preferences editor was asked for, None leaves a setting as it is */
#[derive(Debug, Default, Clone)]
pub struct PrefEdits {
 pub capacity: Option<String>,
 pub paste_timeout: Option<String>,
 pub auto_paste: Option<bool>,
 pub reset_on_paste: Option<bool>,
 pub reset_on_cancel: Option<bool>,
 pub move_to_front_on_paste: Option<bool>,
 pub restore_defaults: bool,
}

impl PrefEdits {
 pub fn is_empty(&self) -> bool {
  self.capacity.is_none()
   && self.paste_timeout.is_none()
   && self.auto_paste.is_none()
   && self.reset_on_paste.is_none()
   && self.reset_on_cancel.is_none()
   && self.move_to_front_on_paste.is_none()
   && !self.restore_defaults
 }

 /** validates everything first, the settings are only touched when all edits are fine */
 pub fn apply(&self, current: &StoredSettings) -> Result<StoredSettings, Vec<(&'static str, PrefError)>> {
  let mut errors = vec![];
  let mut settings = if self.restore_defaults {
   StoredSettings::default()
  } else {
   current.clone()
  };

  if let Some(input) = &self.capacity {
   match parse_capacity(input) {
    Ok(capacity) => settings.capacity = capacity as f64,
    Err(err) => errors.push(("capacity", err)),
   }
  }

  if let Some(input) = &self.paste_timeout {
   match parse_paste_timeout(input) {
    Ok(seconds) => settings.paste_timeout_seconds = seconds,
    Err(err) => errors.push(("paste-timeout", err)),
   }
  }

  match self.auto_paste {
   Some(false) => settings.paste_timeout_seconds = -1.0,
   // switching back on without a value restores the default timeout
   Some(true) if settings.paste_timeout_seconds <= 0.0 && self.paste_timeout.is_none() => {
    settings.paste_timeout_seconds = StoredSettings::default().paste_timeout_seconds
   }
   _ => {}
  }

  if let Some(value) = self.reset_on_paste {
   settings.reset_on_paste = value;
  }
  if let Some(value) = self.reset_on_cancel {
   settings.reset_on_cancel = value;
  }
  if let Some(value) = self.move_to_front_on_paste {
   settings.move_to_front_on_paste = value;
  }

  if errors.is_empty() {
   Ok(settings)
  } else {
   Err(errors)
  }
 }
}

#[cfg(test)]
mod tests {
 use crate::config::StoredSettings;
 use crate::preferences::{parse_capacity, parse_paste_timeout, PrefEdits, PrefError};

 #[test]
 fn capacity_rules() {
  assert_eq!(parse_capacity("40"), Ok(40));
  assert_eq!(parse_capacity(" 256 "), Ok(256));
  assert_eq!(parse_capacity("257"), Err(PrefError::CapacityTooHigh));
  assert_eq!(parse_capacity("0"), Err(PrefError::CapacityNotPositive));
  assert_eq!(parse_capacity("-3"), Err(PrefError::CapacityNotPositive));
  assert_eq!(parse_capacity("4.5"), Err(PrefError::NotWhole));
  assert_eq!(parse_capacity("many"), Err(PrefError::NotWhole));
 }

 #[test]
 fn paste_timeout_rules() {
  assert_eq!(parse_paste_timeout("2"), Ok(2.0));
  assert_eq!(parse_paste_timeout("1.125"), Ok(1.125));
  assert_eq!(parse_paste_timeout(".5"), Ok(0.5));
  assert_eq!(parse_paste_timeout("0"), Ok(0.0));
  assert_eq!(parse_paste_timeout("1.1234"), Err(PrefError::TimeoutTooPrecise));
  assert_eq!(parse_paste_timeout("-1"), Err(PrefError::TimeoutNegative));
  assert_eq!(parse_paste_timeout("600.5"), Err(PrefError::TimeoutTooHigh));
  assert_eq!(parse_paste_timeout("soon"), Err(PrefError::NotNumber));
 }

 #[test]
 fn any_invalid_edit_rejects_the_whole_set() {
  let edits = PrefEdits {
   capacity: Some("1000".into()),
   reset_on_paste: Some(false),
   ..PrefEdits::default()
  };
  let errors = edits.apply(&StoredSettings::default()).unwrap_err();
  assert_eq!(errors, vec![("capacity", PrefError::CapacityTooHigh)]);
 }

 #[test]
 fn auto_paste_off_stores_a_negative_timeout() {
  let edits = PrefEdits {
   auto_paste: Some(false),
   ..PrefEdits::default()
  };
  let settings = edits.apply(&StoredSettings::default()).unwrap();
  assert_eq!(settings.paste_timeout_seconds, -1.0);
  let (policy, _) = settings.to_policy();
  assert_eq!(policy.paste_timeout(), None);
 }

 #[test]
 fn auto_paste_back_on_restores_the_default_timeout() {
  let current = StoredSettings {
   paste_timeout_seconds: -1.0,
   ..StoredSettings::default()
  };
  let edits = PrefEdits {
   auto_paste: Some(true),
   ..PrefEdits::default()
  };
  assert_eq!(edits.apply(&current).unwrap().paste_timeout_seconds, 2.0);
 }

 #[test]
 fn restore_defaults_then_edit() {
  let current = StoredSettings {
   capacity: 9.0,
   reset_on_cancel: true,
   ..StoredSettings::default()
  };
  let edits = PrefEdits {
   restore_defaults: true,
   move_to_front_on_paste: Some(true),
   ..PrefEdits::default()
  };
  let settings = edits.apply(&current).unwrap();
  assert_eq!(settings.capacity, 40.0);
  assert!(!settings.reset_on_cancel);
  assert!(settings.move_to_front_on_paste);
 }
}
