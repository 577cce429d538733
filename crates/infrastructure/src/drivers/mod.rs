mod simulator;

pub use simulator::{SimulatorConfig, SimulatorDriver};
