// Library exports for contact-assist
// This allows the modules to be imported in tests and external code

pub mod assistant;
pub mod client;
pub mod config;
pub mod conversation;
pub mod dispatch;
pub mod error;
pub mod input;
pub mod mention;
pub mod overlay;
pub mod palette;
pub mod search;
pub mod tui;
