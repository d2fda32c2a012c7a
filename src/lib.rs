pub mod api;
pub mod app;
pub mod config;
pub mod keys;
pub mod logging;
pub mod runtime;
pub mod state;
pub mod terminal;
pub mod types;
pub mod ui;
pub mod util;

#[cfg(test)]
mod test_support;
