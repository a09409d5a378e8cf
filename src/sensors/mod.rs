// Sensor adapters. Each one turns a raw reading into calls on the eye
// controller's public API; the transports behind them are capability traits
// so the adapters stay testable off-hardware.

pub mod light;
pub mod person;
