//! Ratatui front-end. `App` owns the connection and every piece of view
//! state; `run_app` drives the draw/input loop until the user quits.

mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
