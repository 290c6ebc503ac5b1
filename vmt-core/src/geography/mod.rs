pub mod grid;
pub mod resources;

pub use grid::*;
pub use resources::*;
