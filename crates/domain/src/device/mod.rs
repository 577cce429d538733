mod entity;
mod state;

pub use entity::{Addressable, Device};
pub use state::{AdminState, OperatingState};
