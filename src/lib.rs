pub mod error;
pub mod gui;
pub mod logging;
pub mod overlay;
pub mod search;
pub mod settings;
pub mod view;
