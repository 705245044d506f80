pub mod olm;
pub mod v1alpha1;

pub use olm::*;
pub use v1alpha1::*;
