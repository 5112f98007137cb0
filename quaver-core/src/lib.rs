#![allow(clippy::new_without_default)]

pub mod engine;
pub mod error;
pub mod input;
pub mod player;
pub mod resolver;
pub mod search;
pub mod session;
pub mod store;
pub mod track;
pub mod util;
