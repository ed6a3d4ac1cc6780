// Ramped motor outputs with leader/follower grouping
//
// - output: the ramping core and output groups
// - sim: simulated device families for running without hardware
// - drive, runtime: a tank-drive caller that ticks the outputs at a fixed rate

pub mod config;
pub mod drive;
pub mod messages;
pub mod output;
pub mod runtime;
pub mod sim;
