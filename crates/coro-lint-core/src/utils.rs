//! Utility functions for suppression handling.

pub mod allowance;
pub mod annotations;

#[doc(inline)]
pub use allowance::{check_allow_with_reason, AllowCheck};
#[doc(inline)]
pub use annotations::{has_suppress_annotation, is_suppressed_by_annotation};
