pub mod app;
pub mod config;
pub mod dataset;
pub mod layout;
pub mod pane;
pub mod selection;
pub mod viewport;

mod util;
