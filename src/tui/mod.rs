// TUI module - local terminal front end of the console

pub mod dialog;
pub mod keys;
pub mod menu;
pub mod overlay;
pub mod renderer;
pub mod terminal;
pub mod ui;
pub mod widgets;
