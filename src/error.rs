use thiserror::Error;

/** everything which can go wrong outside of the history itself */
#[derive(Debug, Error)]
pub enum MyError {
 #[error("config file {path}: {reason}")]
 Config { path: String, reason: String },

 #[error("clipboard: {0}")]
 Clipboard(#[from] ClipboardError),

 #[error("hot key {0} could not be registered")]
 HotkeyRegistration(String),

 #[error("hot key description {0:?} not understood")]
 HotkeyParse(String),

 #[error("paste injection: {0}")]
 Injection(String),

 #[error("x11: {0}")]
 X11(String),

 #[error("terminal: {0}")]
 Terminal(#[from] std::io::Error),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClipboardError {
 #[error("could not read the clipboard: {0}")]
 Read(String),

 #[error("could not write the clipboard: {0}")]
 Write(String),

 #[error("no clipboard connection: {0}")]
 Connect(String),
}

impl From<xcb_1::Error> for MyError {
 fn from(value: xcb_1::Error) -> Self {
  MyError::X11(format!("{value:?}"))
 }
}

impl From<xcb_1::ConnError> for MyError {
 fn from(value: xcb_1::ConnError) -> Self {
  MyError::X11(format!("{value:?}"))
 }
}
