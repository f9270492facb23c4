#[macro_use]
extern crate tracing;

pub mod backend;
pub mod cursor;
pub mod handlers;
pub mod input;
pub mod layout;
pub mod strata;
pub mod utils;
pub mod window;

#[cfg(test)]
mod tests;
