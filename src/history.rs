/** the clips captured from the clipboard, most recent first, with a browsing cursor */
#[derive(Debug, Clone)]
pub struct ClipHistory {
 entries: Vec<String>,
 capacity: usize,
 cursor: usize,
}

// constraints:
// capacity >= 1
// entries.len() <= capacity
// cursor < entries.len() (or 0 when empty)

impl ClipHistory {
 pub fn new(capacity: usize) -> Self {
  let capacity = capacity.max(1);
  Self {
   entries: Vec::with_capacity(capacity),
   capacity,
   cursor: 0,
  }
 }

 pub fn add_new_clip(&mut self, clip: impl Into<String>) {
  let clip = clip.into();
  if clip.is_empty() {
   return;
  }
  self.entries.insert(0, clip);
  if self.entries.len() > self.capacity {
   self.entries.pop();
  }
 }

 pub fn current_clip(&self) -> &str {
  self.entries.get(self.cursor).map_or("", String::as_str)
 }

 pub fn most_recent_clip(&self) -> &str {
  self.entries.first().map_or("", String::as_str)
 }

 pub fn next(&mut self) {
  if !self.entries.is_empty() {
   self.cursor = (self.cursor + 1) % self.entries.len();
  }
 }

 pub fn prev(&mut self) {
  let len = self.entries.len();
  if len > 0 {
   self.cursor = (self.cursor + len - 1) % len;
  }
 }

 pub fn reset(&mut self) {
  self.cursor = 0;
 }

 /** an empty history keeps the cursor at 0, the display helpers show 0/0 then */
 pub fn go_to_end(&mut self) {
  self.cursor = self.entries.len().saturating_sub(1);
 }

 pub fn remove_current(&mut self) {
  self.remove_at(self.cursor);
 }

 /** out of range indices are ignored, the cursor moves to the previous entry only when it fell off the end */
 pub fn remove_at(&mut self, index: usize) {
  if index >= self.entries.len() {
   return;
  }
  self.entries.remove(index);
  if self.cursor > 0 && self.cursor > self.entries.len().saturating_sub(1) {
   self.cursor -= 1;
  }
 }

 pub fn trim_from_end(&mut self, count: usize) {
  let keep = self.entries.len().saturating_sub(count);
  self.entries.truncate(keep);
  self.clamp_cursor();
 }

 /** applies a new capacity, a smaller one drops the oldest clips */
 pub fn set_capacity(&mut self, capacity: usize) {
  self.capacity = capacity.max(1);
  if self.entries.len() > self.capacity {
   self.trim_from_end(self.entries.len() - self.capacity);
  }
 }

 pub fn clear(&mut self) {
  self.entries.clear();
  self.cursor = 0;
 }

 fn clamp_cursor(&mut self) {
  self.cursor = self.cursor.min(self.entries.len().saturating_sub(1));
 }

 pub fn cursor(&self) -> usize {
  self.cursor
 }

 pub fn capacity(&self) -> usize {
  self.capacity
 }

 pub fn len(&self) -> usize {
  self.entries.len()
 }

 pub fn is_empty(&self) -> bool {
  self.entries.is_empty()
 }

 pub fn entries(&self) -> &[String] {
  &self.entries
 }

 /** 1 based, 0 for the empty history */
 pub fn current_for_display(&self) -> usize {
  if self.entries.is_empty() {
   0
  } else {
   self.cursor + 1
  }
 }

 pub fn count_for_display(&self) -> usize {
  self.entries.len()
 }

 pub fn label(&self) -> String {
  format!("{}/{}", self.current_for_display(), self.count_for_display())
 }
}

#[cfg(test)]
mod tests {
 use crate::history::ClipHistory;

 fn filled(capacity: usize, clips: &[&str]) -> ClipHistory {
  let mut history = ClipHistory::new(capacity);
  for clip in clips {
   history.add_new_clip(*clip);
  }
  history
 }

 #[test]
 fn length_never_exceeds_capacity() {
  let mut history = ClipHistory::new(5);
  for i in 0..50 {
   history.add_new_clip(format!("clip {i}"));
   assert!(history.len() <= 5);
  }
  assert_eq!(history.most_recent_clip(), "clip 49");
 }

 #[test]
 fn empty_clip_changes_nothing() {
  let mut history = filled(3, &["a", "b"]);
  history.next();
  history.add_new_clip("");
  assert_eq!(history.entries(), &["b".to_string(), "a".to_string()]);
  assert_eq!(history.cursor(), 1);
 }

 #[test]
 fn overflow_evicts_the_oldest() {
  let history = filled(3, &["1", "2", "3", "4"]);
  assert_eq!(history.len(), 3);
  assert_eq!(history.most_recent_clip(), "4");
  assert!(!history.entries().contains(&"1".to_string()));
 }

 #[test]
 fn next_then_prev_returns_to_the_same_cursor() {
  let mut history = filled(10, &["a", "b", "c", "d"]);
  for start in 0..history.len() {
   history.reset();
   for _ in 0..start {
    history.next();
   }
   history.next();
   history.prev();
   assert_eq!(history.cursor(), start);
  }
 }

 #[test]
 fn navigation_wraps_around() {
  let mut history = filled(10, &["a", "b", "c"]);
  history.prev();
  assert_eq!(history.current_clip(), "a");
  history.next();
  assert_eq!(history.current_clip(), "c");
 }

 #[test]
 fn removing_the_last_entry_empties_the_history() {
  let mut history = filled(3, &["only"]);
  history.remove_current();
  assert!(history.is_empty());
  assert_eq!(history.current_clip(), "");
  assert_eq!(history.label(), "0/0");
 }

 #[test]
 fn remove_scenario_keeps_cursor_on_a_neighbour() {
  let mut history = filled(3, &["a", "b", "c", "d"]);
  assert_eq!(history.entries(), &["d".to_string(), "c".to_string(), "b".to_string()]);
  assert_eq!(history.most_recent_clip(), "d");
  history.next();
  assert_eq!(history.cursor(), 1);
  assert_eq!(history.current_clip(), "c");
  history.remove_current();
  assert_eq!(history.entries(), &["d".to_string(), "b".to_string()]);
  assert_eq!(history.cursor(), 1);
  assert_eq!(history.current_clip(), "b");
 }

 #[test]
 fn removing_the_tail_under_the_cursor_steps_back() {
  let mut history = filled(5, &["a", "b", "c"]);
  history.go_to_end();
  history.remove_current();
  assert_eq!(history.cursor(), 1);
  assert_eq!(history.current_clip(), "b");
 }

 #[test]
 fn remove_out_of_range_is_ignored() {
  let mut history = filled(5, &["a", "b"]);
  history.remove_at(7);
  assert_eq!(history.len(), 2);
 }

 #[test]
 fn operations_on_empty_history_are_noops() {
  let mut history = ClipHistory::new(4);
  history.next();
  history.prev();
  history.go_to_end();
  history.remove_current();
  assert_eq!(history.cursor(), 0);
  assert_eq!(history.current_for_display(), 0);
  assert_eq!(history.most_recent_clip(), "");
 }

 #[test]
 fn shrinking_capacity_trims_the_tail_and_clamps_the_cursor() {
  let mut history = filled(10, &["a", "b", "c", "d", "e"]);
  history.go_to_end();
  history.set_capacity(2);
  assert_eq!(history.entries(), &["e".to_string(), "d".to_string()]);
  assert_eq!(history.cursor(), 1);
  history.add_new_clip("f");
  assert_eq!(history.len(), 2);
 }

 #[test]
 fn trim_from_end_removes_at_most_the_length() {
  let mut history = filled(10, &["a", "b"]);
  history.trim_from_end(5);
  assert!(history.is_empty());
  assert_eq!(history.cursor(), 0);
 }

 #[test]
 fn duplicates_are_distinct_entries() {
  let history = filled(10, &["x", "y", "x"]);
  assert_eq!(history.len(), 3);
 }

 #[test]
 fn label_is_one_based() {
  let mut history = filled(10, &["a", "b", "c"]);
  history.next();
  assert_eq!(history.label(), "2/3");
 }
}
