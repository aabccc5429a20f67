//! # HTTP Server Module
//!
//! JSON/multipart API over the post service.
//!
//! # Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /posts` - Posts in display order
//! - `POST /posts` - Add a post (multipart)
//! - `PUT /posts/:id` - Edit a post (multipart)
//! - `DELETE /posts/:id` - Delete a post
//! - `POST /posts/resequence` - Repair stored ranks
//! - `POST /maintenance/sweep` - Delete unreferenced blobs
//! - `GET /blobs/*path?token=` - Blob download

pub mod blob_routes;
pub mod config;
pub mod form;
pub mod health_routes;
pub mod post_routes;
pub mod response;
pub mod server;
pub mod state;

pub use config::HttpServerConfig;
pub use response::ErrorResponse;
pub use server::{build_router, HttpServer};
pub use state::AppState;
