pub mod calibration;
pub mod client;
pub mod clock;
pub mod config;
pub mod formats;
pub mod model;
pub mod pages;
pub mod pipeline;
pub mod protocol;
pub mod server;
pub mod session;
pub mod text_file;
pub mod timeline;
