mod build;
mod macros;

pub use build::*;
