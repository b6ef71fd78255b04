extern crate clap;
extern crate termion;
extern crate x11_clipboard;

use std::{
 cell::RefCell,
 io::{stdin, stdout, BufRead, Write},
 os::fd::AsFd,
 path::PathBuf,
 process::ExitCode,
 rc::Rc,
 sync::mpsc::{self, Receiver, RecvTimeoutError, Sender},
 thread::{self, JoinHandle},
 time::Instant,
};

use clap::{Parser, Subcommand};
use nu_ansi_term::{AnsiGenericString, Color};
use signal_hook::consts::signal::*;
use signal_hook::iterator::Signals;
use termion::{input::TermRead, is_tty};
use tracing::{debug, error, info, trace, warn};

use crate::clipboards::{ChangeDetector, ClipboardBridge, ClipboardService, X11Clipboard};
use crate::config::{
 sleep_default, Config, ConfigStore, StoredSettings, DEFAULT_CONFIG_FILE, DEFAULT_HOTKEY,
 DEFAULT_LOG_FILE, DEFAULT_TIMEOUT,
};
use crate::controller::{InputController, OverlayCommand};
use crate::debug::{init_logging, monitor};
use crate::error::MyError;
use crate::event::{push_event, MyEvent, StopFlag};
use crate::hotkey::{overlay_window_from_env, register_with_retry, Hotkey, HotkeyThread, X11Hotkeys};
use crate::injector::EnigoInjector;
use crate::keymap::{map_key, KeyAction};
use crate::preferences::PrefEdits;
use crate::termionscreen::{OverlayModel, TermionScreen};

type AppController = InputController<X11Clipboard, EnigoInjector>;

#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Args {
 #[arg(long, default_value_t = false)]
 pub(crate) debug: bool,
 /** the settings file */
 #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
 pub(crate) config: PathBuf,
 /** e.g. ctrl+shift+v, alt+insert, super+f12 */
 #[arg(long, default_value = DEFAULT_HOTKEY)]
 pub(crate) hotkey: String,
 #[arg(long, default_value = DEFAULT_LOG_FILE)]
 pub(crate) log_file: PathBuf,
 #[command(subcommand)]
 pub(crate) command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
 /** shows the settings, or edits them when options are given */
 Prefs(PrefsArgs),
}

#[derive(clap::Args, Debug, Default)]
pub struct PrefsArgs {
 /** clips kept, 1 to 256 */
 #[arg(long, allow_hyphen_values = true)]
 capacity: Option<String>,
 /** seconds until the shown clip is pasted, at most 3 decimals */
 #[arg(long, allow_hyphen_values = true)]
 paste_timeout: Option<String>,
 #[arg(long)]
 auto_paste: Option<bool>,
 #[arg(long)]
 reset_on_paste: Option<bool>,
 #[arg(long)]
 reset_on_cancel: Option<bool>,
 #[arg(long = "move-to-front")]
 move_to_front_on_paste: Option<bool>,
 #[arg(long, default_value_t = false)]
 restore_defaults: bool,
}

impl From<&PrefsArgs> for PrefEdits {
 fn from(args: &PrefsArgs) -> Self {
  Self {
   capacity: args.capacity.clone(),
   paste_timeout: args.paste_timeout.clone(),
   auto_paste: args.auto_paste,
   reset_on_paste: args.reset_on_paste,
   reset_on_cancel: args.reset_on_cancel,
   move_to_front_on_paste: args.move_to_front_on_paste,
   restore_defaults: args.restore_defaults,
  }
 }
}

/** polls the clipboard and reports new text */
pub struct ClipboardThread {
 clipboard: X11Clipboard,
}

impl ClipboardThread {
 fn new() -> Result<Self, MyError> {
  Ok(Self {
   clipboard: X11Clipboard::new()?,
  })
 }

 fn run(mut self, tx: Sender<MyEvent>, stop: StopFlag) -> JoinHandle<()> {
  thread::spawn(move || {
   let mut detector = ChangeDetector::new();
   loop {
    if stop.get_stop_threads() {
     break;
    }

    sleep_default();

    if let Some(text) = detector.observe(self.clipboard.read_text()) {
     trace!(len = text.len(), "clipboard changed");
     if !push_event(&tx, &stop, MyEvent::ClipboardChanged(Some(text))) {
      break;
     }
    }
   }
  })
 }
}

/// blocking
/** sends termion events to the event loop */
struct TermionLoop {}

impl TermionLoop {
 fn new() -> Self {
  Self {}
 }

 fn run_loop(&mut self, tx: Sender<MyEvent>, stop: StopFlag) -> JoinHandle<()> {
  thread::spawn(move || {
   for event in stdin().events() {
    if stop.get_stop_threads() {
     break;
    }
    match event {
     Ok(event) => {
      if !push_event(&tx, &stop, MyEvent::Termion(event)) {
       break;
      }
     }
     Err(err) => {
      warn!("terminal input ended: {}", err);
      break;
     }
    }
   }
  })
 }
}

/** sends SIGWINCH, SIGINT, SIGTERM events to the event loop */
struct MySignalsLoop {
 signals: Signals,
}

impl MySignalsLoop {
 pub fn new() -> Result<Self, MyError> {
  Ok(Self {
   signals: Signals::new([SIGWINCH, SIGINT, SIGTERM])?,
  })
 }

 fn run_thread(mut self, tx: Sender<MyEvent>, stop: StopFlag) -> JoinHandle<()> {
  thread::spawn(move || {
   for signal in &mut self.signals {
    if stop.get_stop_threads() {
     break;
    }
    if !push_event(&tx, &stop, MyEvent::SignalHook(signal)) {
     break;
    }
   }
  })
 }
}

/** asked on the still cooked terminal before the overlay starts */
fn ask_retry(hotkey: &Hotkey) -> bool {
 print!(
  "{} ",
  Color::Yellow.paint(format!(
   "The hot key {} could not be registered, another program may use it. Retry? [y/N]",
   hotkey
  ))
 );
 let _ = stdout().flush();

 let mut answer = String::new();
 if BufRead::read_line(&mut stdin().lock(), &mut answer).is_err() {
  return false;
 }
 matches!(answer.trim(), "y" | "Y" | "yes")
}

fn reload(controller: &mut AppController, store: &ConfigStore) {
 let loaded = store.load();
 for warning in &loaded.warnings {
  controller.notice(warning);
 }
 if !controller.apply_policy(loaded.policy) {
  debug!("reload ignored while browsing");
 }
}

fn handle_event(
 event: MyEvent,
 controller: &mut AppController,
 screen: &mut TermionScreen,
 store: &ConfigStore,
) -> Result<(), MyError> {
 let now = Instant::now();

 match event {
  MyEvent::HotKey => controller.on_hotkey(now),
  MyEvent::OverlayFocus(false) => controller.on_overlay(OverlayCommand::FocusLost, now),
  MyEvent::OverlayFocus(true) => trace!("overlay focused"),
  MyEvent::ClipboardChanged(observed) => {
   let outcome = controller.on_clipboard_changed(observed.as_deref());
   trace!(?outcome, "clipboard change handled");
  }
  MyEvent::SignalHook(SIGWINCH) => screen.resize()?,
  MyEvent::SignalHook(signal) => trace!(signal, "signal ignored"),
  MyEvent::Termion(event) => match map_key(&event, controller.state(), screen.help_shown()) {
   KeyAction::Overlay(command) => controller.on_overlay(command, now),
   KeyAction::Help => screen.show_help(),
   KeyAction::Quit => screen.close_help(),
   KeyAction::ScrollUp => {
    if let Some(help) = screen.help_mut() {
     help.scroll_up();
    }
   }
   KeyAction::ScrollDown => {
    if let Some(help) = screen.help_mut() {
     help.scroll_down();
    }
   }
   KeyAction::Clear => {
    controller.clear();
   }
   KeyAction::Pause => {
    controller.toggle_pause();
   }
   KeyAction::Reload => reload(controller, store),
   KeyAction::Unbound => trace!(?event, "unbound"),
  },
 }
 Ok(())
}

/** the single consumer: owns controller and screen until a stop event arrives */
fn run_event_loop(
 controller: &mut AppController,
 screen: &mut TermionScreen,
 store: &ConfigStore,
 rx: &Receiver<MyEvent>,
) -> Result<(), MyError> {
 loop {
  screen.paint(controller.history().len())?;

  match rx.recv_timeout(DEFAULT_TIMEOUT) {
   Ok(event) if event.is_stop_event() => {
    info!("stop requested");
    break;
   }
   Ok(event) => handle_event(event, controller, screen, store)?,
   Err(RecvTimeoutError::Timeout) => {}
   Err(RecvTimeoutError::Disconnected) => break,
  }

  controller.on_tick(Instant::now());
 }
 Ok(())
}

fn run(config: &Config) -> Result<(), MyError> {
 let store = ConfigStore::new(&config.config_path);
 let loaded = store.load();

 let mut hotkeys = X11Hotkeys::connect()?;
 register_with_retry(&mut hotkeys, &config.hotkey, ask_retry)?;
 monitor("hotkey");

 let bridge = ClipboardBridge::new(X11Clipboard::new()?);
 let mut controller = InputController::new(loaded.policy, bridge, EnigoInjector);
 let model = Rc::new(RefCell::new(OverlayModel::new()));
 controller.subscribe(Box::new(model.clone()));
 for warning in &loaded.warnings {
  controller.notice(warning);
 }

 let (tx, rx) = mpsc::channel();
 let stop = StopFlag::new();

 monitor("ct");
 let ctjh = ClipboardThread::new()?.run(tx.clone(), stop.clone());

 monitor("ht");
 let htjh = HotkeyThread::new(hotkeys.connection(), overlay_window_from_env()).run(tx.clone(), stop.clone());

 monitor("ms");
 let _msjh = MySignalsLoop::new()?.run_thread(tx.clone(), stop.clone());

 let mut screen = TermionScreen::new(model, config.hotkey.clone())?;

 monitor("tl");
 let _tljh = TermionLoop::new().run_loop(tx, stop.clone());

 info!(hotkey = %config.hotkey, "running");
 let result = run_event_loop(&mut controller, &mut screen, &store, &rx);

 stop.stop();
 drop(screen);

 monitor("ctjh");
 let _ = ctjh.join();
 monitor("htjh");
 let _ = htjh.join();
 // the stdin and signal threads block, joining them would hang

 result
}

fn print_settings(settings: &StoredSettings) {
 let (policy, _) = settings.to_policy();
 println!("capacity ............... {}", policy.capacity);
 match policy.paste_timeout() {
  Some(timeout) => println!("paste timeout .......... {:.3} s", timeout.as_secs_f64()),
  None => println!("paste timeout .......... disabled"),
 }
 println!("reset on paste ......... {}", policy.reset_on_paste);
 println!("reset on cancel ........ {}", policy.reset_on_cancel);
 println!("move to front on paste . {}", policy.move_to_front_on_paste);
}

fn run_prefs(config: &Config, args: &PrefsArgs) -> ExitCode {
 let store = ConfigStore::new(&config.config_path);
 let loaded = store.load();
 for warning in &loaded.warnings {
  eprintln!("{}", Color::Yellow.paint(warning));
 }

 let edits = PrefEdits::from(args);
 if edits.is_empty() {
  print_settings(&loaded.settings);
  return ExitCode::SUCCESS;
 }

 match edits.apply(&loaded.settings) {
  Ok(settings) => match store.save(&settings) {
   Ok(()) => {
    info!(path = %store.path().display(), "settings saved");
    println!("{}", Color::Green.paint(format!("saved {}", store.path().display())));
    print_settings(&settings);
    ExitCode::SUCCESS
   }
   Err(err) => {
    eprintln!("{}", Color::Red.paint(err.to_string()));
    ExitCode::FAILURE
   }
  },
  Err(errors) => {
   for (field, err) in errors {
    eprintln!("{}", Color::Red.paint(format!("{}: {}", field, err)));
   }
   ExitCode::FAILURE
  }
 }
}

pub fn main() -> ExitCode {
 let args = Args::parse();

 let config = match Config::from_args(&args) {
  Ok(config) => config,
  Err(err) => {
   eprintln!("{}", Color::Red.paint(err.to_string()));
   return ExitCode::FAILURE;
  }
 };

 if let Err(err) = init_logging(&config.log_file, config.debug) {
  eprintln!("{}", Color::Red.paint(err.to_string()));
  return ExitCode::FAILURE;
 }

 if let Some(Command::Prefs(prefs)) = &args.command {
  return run_prefs(&config, prefs);
 }

 match (is_tty(&stdin().as_fd()), is_tty(&stdout().as_fd())) {
  (true, true) => {}
  (true, false) => {
   eprintln!("stdout is not a tty");
   return ExitCode::FAILURE;
  }
  (false, true) => {
   eprintln!("stdin is not a tty");
   return ExitCode::FAILURE;
  }
  (false, false) => {
   eprintln!("stdin and stdout are not ttys");
   return ExitCode::FAILURE;
  }
 }

 println!("{}", AnsiGenericString::title("clipcycle"));
 monitor("start");

 let exit = match run(&config) {
  Ok(()) => ExitCode::SUCCESS,
  Err(err) => {
   error!("{}", err);
   eprintln!("{}", Color::Red.paint(err.to_string()));
   ExitCode::FAILURE
  }
 };

 monitor("end");
 println!("{}", AnsiGenericString::title("clipcycle ended"));
 exit
}

#[cfg(test)]
mod tests {
 use clap::Parser;

 use crate::config::Config;
 use crate::libmain::{Args, Command};
 use crate::preferences::PrefEdits;

 #[test]
 fn defaults() {
  let args = Args::parse_from(["clipcycle"]);
  let config = Config::from_args(&args).unwrap();
  assert!(!config.debug);
  assert_eq!(config.config_path.to_str(), Some(".clipcycle.json"));
  assert_eq!(config.hotkey.to_string(), "ctrl+shift+v");
  assert!(args.command.is_none());
 }

 #[test]
 fn bad_hotkey_is_a_config_error() {
  let args = Args::parse_from(["clipcycle", "--hotkey", "ctrl+shift"]);
  assert!(Config::from_args(&args).is_err());
 }

 #[test]
 fn prefs_options_become_edits() {
  let args = Args::parse_from([
   "clipcycle",
   "prefs",
   "--capacity",
   "-3",
   "--auto-paste",
   "false",
   "--move-to-front",
   "true",
  ]);
  let Some(Command::Prefs(prefs)) = &args.command else {
   panic!("prefs subcommand expected");
  };
  let edits = PrefEdits::from(prefs);
  assert_eq!(edits.capacity.as_deref(), Some("-3"));
  assert_eq!(edits.auto_paste, Some(false));
  assert_eq!(edits.move_to_front_on_paste, Some(true));
  assert!(!edits.restore_defaults);
 }
}
