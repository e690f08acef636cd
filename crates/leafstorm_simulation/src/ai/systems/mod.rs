//! AI systems

pub mod attack;
pub mod decision;
pub mod targeting;

pub use attack::*;
pub use decision::*;
pub use targeting::*;
