#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

//! VerusHash proof-of-work hashing for share and block scoring.
//!
//! This crate is responsible for:
//! - the five hash variants (`hash`, `hash2`, `hash2b`, `hash2b1`, `hash2b2`)
//! - PBaaS merge-mining detection for `hash2b2`
//! - canonicalizing verified merge-mined headers before hashing
//!
//! It intentionally does **not** implement the Haraka/CLHash round functions;
//! those plug in through [`engine::Compressor`] and [`engine::Mixer`].

pub mod dispatch;
pub mod engine;
pub mod error;
pub mod merge_mining;
pub mod preheader;

pub use dispatch::*;
pub use engine::*;
pub use error::*;
pub use merge_mining::*;
pub use preheader::*;
