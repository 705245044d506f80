mod addon;
mod addon_operator;
mod status;
mod types;

pub use addon::*;
pub use addon_operator::*;
pub use status::*;
pub use types::*;
