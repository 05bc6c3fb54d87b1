pub mod broadcast;
pub mod input;
pub mod process;
pub mod screen;
pub mod supervisor;
