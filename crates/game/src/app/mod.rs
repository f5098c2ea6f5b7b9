pub(crate) mod bootstrap;
mod demo_services;
pub(crate) mod loop_runner;
mod scenario;
