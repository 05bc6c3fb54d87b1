pub mod popup;
pub mod screen;
pub mod status;
