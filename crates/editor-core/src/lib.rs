mod builders;
mod command;
mod config;
mod core;
mod error;
mod formats;
mod history;
mod ops;
mod stats;
mod surface;
mod timer;
mod upload;

pub use crate::builders::*;
pub use crate::command::*;
pub use crate::config::*;
pub use crate::core::*;
pub use crate::error::*;
pub use crate::formats::*;
pub use crate::history::*;
pub use crate::ops::*;
pub use crate::stats::*;
pub use crate::surface::*;
pub use crate::timer::*;
pub use crate::upload::*;
