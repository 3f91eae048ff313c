mod config;
mod line;
mod writer;

pub use config::*;
pub use line::*;
pub use writer::*;
