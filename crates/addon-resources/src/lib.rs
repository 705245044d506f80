pub mod common;
pub mod operator_group;
