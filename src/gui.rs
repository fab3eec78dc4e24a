pub mod config_window;
pub mod image_viewer;
pub mod main_window;
pub mod popups;
