use ratatui::layout::{Constraint, Layout, Rect};

pub struct OverlayLayout {
 pub title_area: Rect,
 pub main_area: Rect,
 pub status_area: Rect,
}

impl OverlayLayout {
 pub fn new(area: Rect) -> Self {
  use Constraint::{Length, Min};

  let vertical = Layout::vertical([Length(1), Min(0), Length(1)]);
  let [title_area, main_area, status_area] = vertical.areas(area);

  Self {
   title_area,
   main_area,
   status_area,
  }
 }
}
