//! Schema module - Search-space, settings and snapshot types.

mod settings;
mod space;
mod state;

pub use settings::*;
pub use space::*;
pub use state::*;
