//! folio - an ordered portfolio of posts
//!
//! Each post has a title, a description, a thumbnail image and a link to
//! either an uploaded file or an external URL. Posts are kept in a dense,
//! user-controlled display order.

pub mod blob_store;
pub mod cli;
pub mod http_server;
pub mod observability;
pub mod ordering;
pub mod post;
pub mod record_store;
pub mod service;
