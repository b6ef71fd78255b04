pub mod clipboards;
pub mod config;
pub mod controller;
pub mod debug;
pub mod error;
pub mod event;
pub mod history;
pub mod hotkey;
pub mod injector;
pub mod keymap;
pub mod layout_ratatui;
pub mod libmain;
pub mod observer;
pub mod policy;
pub mod preferences;
pub mod termionscreen;
pub mod timer;
pub mod tools;
