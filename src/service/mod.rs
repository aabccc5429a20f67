//! # Post Mutation Service
//!
//! Add, edit, delete and reorder posts on top of a record store, a blob
//! store and the ordering engine.
//!
//! Every mutation starts from a fresh listing and validates before any side
//! effect. Ranks stay dense after every successful mutation that starts from
//! a consistent collection.

mod errors;
mod mutation;
mod request;
mod sweep;
mod validation;

pub use errors::{PostError, PostResult};
pub use mutation::{PostListing, PostService};
pub use request::{ContentChange, ContentSelector, NewPost, PostEdit, Upload};
pub use sweep::SweepReport;
pub use validation::{validate_external_url, validate_new_post, validate_post_edit, ValidationError};
