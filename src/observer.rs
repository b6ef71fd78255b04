use std::{cell::RefCell, rc::Rc};

/** the properties of the controller an overlay can display */
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Property {
 CurrentClip,
 CurrentLabel,
 Visible,
 Paused,
 Notice,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
 Text(String),
 Flag(bool),
}

pub trait Observer {
 fn property_changed(&mut self, property: Property, value: &Value);
}

impl<T: Observer> Observer for Rc<RefCell<T>> {
 fn property_changed(&mut self, property: Property, value: &Value) {
  self.borrow_mut().property_changed(property, value);
 }
}

#[derive(Default)]
pub struct Observers {
 observers: Vec<Box<dyn Observer>>,
}

impl Observers {
 pub fn subscribe(&mut self, observer: Box<dyn Observer>) {
  self.observers.push(observer);
 }

 pub fn notify(&mut self, property: Property, value: Value) {
  for observer in self.observers.iter_mut() {
   observer.property_changed(property, &value);
  }
 }
}

/** keeps every change, for tests and diagnostics */
#[derive(Default, Debug)]
pub struct Recorder {
 pub changes: Vec<(Property, Value)>,
}

impl Recorder {
 pub fn last(&self, property: Property) -> Option<&Value> {
  self
   .changes
   .iter()
   .rev()
   .find(|(p, _)| *p == property)
   .map(|(_, v)| v)
 }
}

impl Observer for Recorder {
 fn property_changed(&mut self, property: Property, value: &Value) {
  self.changes.push((property, value.clone()));
 }
}
