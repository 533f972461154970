#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

//! VerusHash core: header/solution layout, typed hashes, and bounds-checked
//! byte views.

pub mod constants;
pub mod types;
pub mod view;

pub use constants::*;
pub use types::*;
pub use view::*;
