use std::cell::RefCell;
use std::io::{stdout, Stdout};
use std::rc::Rc;

use ratatui::backend::TermionBackend;
use ratatui::layout::Margin;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Paragraph, Wrap};
use ratatui::{Frame, Terminal};
use termion::raw::{IntoRawMode, RawTerminal};
use termion::screen::{AlternateScreen, IntoAlternateScreen};
use tracing::trace;

use crate::config::USAGE;
use crate::error::MyError;
use crate::hotkey::Hotkey;
use crate::layout_ratatui::OverlayLayout;
use crate::observer::{Observer, Property, Value};
use crate::tools::{flatline, MyTime};

const MAX_NOTICES: usize = 50;

/** what the overlay displays, fed by the controller's notifications */
#[derive(Debug, Default)]
pub struct OverlayModel {
 pub clip: String,
 pub label: String,
 pub visible: bool,
 pub paused: bool,
 pub notices: Vec<(MyTime, String)>,
 dirty: bool,
}

impl OverlayModel {
 pub fn new() -> Self {
  Self {
   dirty: true,
   ..Self::default()
  }
 }

 /** true once after every change */
 pub fn take_dirty(&mut self) -> bool {
  std::mem::take(&mut self.dirty)
 }

 pub fn last_notice(&self) -> Option<&(MyTime, String)> {
  self.notices.last()
 }
}

impl Observer for OverlayModel {
 fn property_changed(&mut self, property: Property, value: &Value) {
  match (property, value) {
   (Property::CurrentClip, Value::Text(text)) => self.clip = text.clone(),
   (Property::CurrentLabel, Value::Text(text)) => self.label = text.clone(),
   (Property::Visible, Value::Flag(flag)) => self.visible = *flag,
   (Property::Paused, Value::Flag(flag)) => self.paused = *flag,
   (Property::Notice, Value::Text(text)) => {
    self.notices.push((MyTime::now(), text.clone()));
    if self.notices.len() > MAX_NOTICES {
     self.notices.remove(0);
    }
   }
   (property, value) => {
    trace!(?property, ?value, "ignored notification");
    return;
   }
  }
  self.dirty = true;
 }
}

/** the state a page needs besides the model */
pub struct ScreenView<'a> {
 pub model: &'a OverlayModel,
 pub hotkey: &'a Hotkey,
 pub clips: usize,
}

pub trait TermionScreenPainter {
 fn paint(&self, frame: &mut Frame, view: &ScreenView);
}

pub struct OverlayPage;

impl OverlayPage {
 fn title(view: &ScreenView) -> Line<'static> {
  let mut spans = vec![
   Span::styled(" clipcycle ", Style::default().add_modifier(Modifier::BOLD)),
   Span::raw(format!("| hot key {} ", view.hotkey)),
  ];
  if view.model.paused {
   spans.push(Span::styled("| paused ", Style::default().fg(Color::Yellow)));
  }
  Line::from(spans)
 }

 fn status(view: &ScreenView) -> Line<'static> {
  match view.model.last_notice() {
   Some((time, notice)) => Line::from(vec![
    Span::raw(format!("{} ", time.get_time())),
    Span::styled(flatline(notice), Style::default().fg(Color::Red)),
   ]),
   None if view.model.visible => Line::raw("Enter pastes, Esc cancels"),
   None => Line::raw("h for help, x exits"),
  }
 }
}

impl TermionScreenPainter for OverlayPage {
 fn paint(&self, frame: &mut Frame, view: &ScreenView) {
  let layout = OverlayLayout::new(frame.area());

  frame.render_widget(Self::title(view), layout.title_area);

  if view.model.visible {
   let block = Block::bordered()
    .title(format!(" {} ", view.model.label))
    .border_style(Style::default().fg(Color::Cyan));
   let clip = Paragraph::new(Text::raw(view.model.clip.as_str()))
    .wrap(Wrap { trim: false })
    .block(block);
   frame.render_widget(clip, layout.main_area);
  } else {
   let idle = Paragraph::new(Text::raw(format!(
    "{} clips, {} browses them",
    view.clips, view.hotkey
   )));
   frame.render_widget(idle, layout.main_area.inner(Margin::new(1, 1)));
  }

  frame.render_widget(Self::status(view), layout.status_area);
 }
}

pub struct HelpPage {
 scroll: u16,
}

impl HelpPage {
 pub fn new() -> Self {
  Self { scroll: 0 }
 }

 pub fn scroll_up(&mut self) {
  self.scroll = self.scroll.saturating_sub(1);
 }

 pub fn scroll_down(&mut self) {
  let lines = USAGE.lines().count() as u16;
  if self.scroll + 1 < lines {
   self.scroll += 1;
  }
 }
}

impl TermionScreenPainter for HelpPage {
 fn paint(&self, frame: &mut Frame, _view: &ScreenView) {
  let layout = OverlayLayout::new(frame.area());
  frame.render_widget(Line::raw(" help | (q)uit, Up, Down"), layout.title_area);
  frame.render_widget(
   Paragraph::new(Text::raw(USAGE)).scroll((self.scroll, 0)),
   layout.main_area.inner(Margin::new(1, 0)),
  );
 }
}

type OverlayBackend = TermionBackend<AlternateScreen<RawTerminal<Stdout>>>;

/** owns the terminal, raw mode and the alternate screen end with it */
pub struct TermionScreen {
 terminal: Terminal<OverlayBackend>,
 model: Rc<RefCell<OverlayModel>>,
 hotkey: Hotkey,
 help: Option<HelpPage>,
 resized: bool,
}

impl TermionScreen {
 pub fn new(model: Rc<RefCell<OverlayModel>>, hotkey: Hotkey) -> Result<Self, MyError> {
  let stdout = stdout().into_raw_mode()?.into_alternate_screen()?;
  let mut terminal = Terminal::new(TermionBackend::new(stdout))?;
  terminal.hide_cursor()?;
  terminal.clear()?;
  Ok(Self {
   terminal,
   model,
   hotkey,
   help: None,
   resized: false,
  })
 }

 pub fn help_shown(&self) -> bool {
  self.help.is_some()
 }

 pub fn show_help(&mut self) {
  self.help = Some(HelpPage::new());
  self.resized = true;
 }

 pub fn close_help(&mut self) {
  self.help = None;
  self.resized = true;
 }

 pub fn help_mut(&mut self) -> Option<&mut HelpPage> {
  self.resized = true;
  self.help.as_mut()
 }

 /** SIGWINCH */
 pub fn resize(&mut self) -> Result<(), MyError> {
  self.terminal.autoresize()?;
  self.resized = true;
  Ok(())
 }

 /** draws only when something changed since the last call */
 pub fn paint(&mut self, clips: usize) -> Result<(), MyError> {
  let dirty = self.model.borrow_mut().take_dirty();
  let resized = std::mem::take(&mut self.resized);
  if !dirty && !resized {
   return Ok(());
  }

  let model = self.model.borrow();
  let view = ScreenView {
   model: &model,
   hotkey: &self.hotkey,
   clips,
  };
  let page: &dyn TermionScreenPainter = match &self.help {
   Some(help) => help,
   None => &OverlayPage,
  };
  self.terminal.draw(|frame| page.paint(frame, &view))?;
  Ok(())
 }
}

#[cfg(test)]
mod tests {
 use ratatui::backend::TestBackend;
 use ratatui::Terminal;

 use crate::hotkey::Hotkey;
 use crate::observer::{Observer, Property, Value};
 use crate::termionscreen::{HelpPage, OverlayModel, OverlayPage, ScreenView, TermionScreenPainter};

 fn render(page: &dyn TermionScreenPainter, model: &OverlayModel) -> String {
  let hotkey: Hotkey = "ctrl+shift+v".parse().unwrap();
  let mut terminal = Terminal::new(TestBackend::new(60, 6)).unwrap();
  let view = ScreenView {
   model,
   hotkey: &hotkey,
   clips: 3,
  };
  terminal.draw(|frame| page.paint(frame, &view)).unwrap();
  terminal
   .backend()
   .buffer()
   .content
   .iter()
   .map(|cell| cell.symbol())
   .collect()
 }

 #[test]
 fn model_follows_notifications() {
  let mut model = OverlayModel::new();
  assert!(model.take_dirty());
  assert!(!model.take_dirty());
  model.property_changed(Property::CurrentClip, &Value::Text("hello".into()));
  model.property_changed(Property::Visible, &Value::Flag(true));
  assert_eq!(model.clip, "hello");
  assert!(model.visible);
  assert!(model.take_dirty());
 }

 #[test]
 fn mismatched_values_are_ignored() {
  let mut model = OverlayModel::new();
  model.take_dirty();
  model.property_changed(Property::Visible, &Value::Text("yes".into()));
  assert!(!model.visible);
  assert!(!model.take_dirty());
 }

 #[test]
 fn browsing_shows_clip_and_label() {
  let mut model = OverlayModel::new();
  model.property_changed(Property::CurrentClip, &Value::Text("second clip".into()));
  model.property_changed(Property::CurrentLabel, &Value::Text("2/3".into()));
  model.property_changed(Property::Visible, &Value::Flag(true));
  let screen = render(&OverlayPage, &model);
  assert!(screen.contains("second clip"));
  assert!(screen.contains(" 2/3 "));
  assert!(screen.contains("Enter pastes"));
 }

 #[test]
 fn idle_shows_count_and_notice() {
  let mut model = OverlayModel::new();
  model.property_changed(Property::Paused, &Value::Flag(true));
  model.property_changed(Property::Notice, &Value::Text("read\nfailed".into()));
  let screen = render(&OverlayPage, &model);
  assert!(screen.contains("3 clips"));
  assert!(screen.contains("paused"));
  assert!(screen.contains("read failed"));
 }

 #[test]
 fn help_scrolls_within_bounds() {
  let mut help = HelpPage::new();
  help.scroll_up();
  let top = render(&help, &OverlayModel::new());
  assert!(top.contains("help"));
  help.scroll_down();
  help.scroll_down();
  assert_eq!(help.scroll, 2);
 }
}
