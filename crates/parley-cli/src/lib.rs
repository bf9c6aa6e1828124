//! Line-oriented shell over [`parley_app::Runtime`].
//!
//! Reads commands from stdin and prints what changed in each published
//! snapshot. All session logic lives in `parley-core`; this crate only parses
//! input lines and renders text.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod command;
pub mod render;

pub use command::{CommandError, Input};
pub use render::Renderer;
