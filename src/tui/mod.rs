mod app;
mod keys;
mod terminal;
mod ui;

pub use app::run;
