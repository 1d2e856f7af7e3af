#[macro_use]
extern crate serde_derive;

pub mod config;
pub mod extract;
pub mod index;
pub mod watch;
