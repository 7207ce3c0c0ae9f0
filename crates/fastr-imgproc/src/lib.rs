#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// color transformations module.
pub mod color;

/// feature detection module.
pub mod features;

/// image filtering module.
pub mod filter;

/// image border padding module.
pub mod padding;

/// module containing parallization utilities.
pub mod parallel;
