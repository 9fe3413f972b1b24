//! Terminal front end for parley
//!
//! A thin shell over [`parley_app`]: it provides the terminal surface, the key
//! source and the render loop, and wires them to the router in the generic
//! [`Runtime`].

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod logging;
pub mod render;

mod keys;
mod runtime;
mod surface;

pub use config::{Args, Config};
pub use keys::{KeySource, TerminalKeys};
pub use runtime::{Runtime, RuntimeError, Shutdown};
pub use surface::{GridSurface, Surface, SurfaceError, TerminalSurface};
