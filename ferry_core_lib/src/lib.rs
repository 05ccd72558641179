#[macro_use]
extern crate log;

pub mod data;
pub mod errors;
pub mod transfers;

pub use errors::{FerryError, Result};
