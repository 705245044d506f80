pub mod addon_operator_controller;
pub mod context;
pub mod controller;
pub mod error;
pub mod gateway;
pub mod metrics;
pub mod operator_group;
pub mod server;
pub mod telemetry;
pub mod upgrade_policy;
