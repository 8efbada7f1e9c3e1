//! # senda
//!
//! A minimal HTTP router for Rust: method + path-pattern routing with named
//! parameters, a request context that exposes query, headers, cookies and
//! body, and content-type driven body decoding.
//!
//! - Radix-tree routing, `:name` parameters, route groups, via [`matchit`]
//! - Body decoding from `Content-Type`: JSON, XML, URL-encoded form, multipart
//! - Responses from strings, status codes, [`Json`], [`Xml`], files, downloads
//! - Async I/O on tokio + hyper, graceful shutdown on SIGTERM / Ctrl-C
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use senda::{Error, Json, Request, Router, Server};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Register { username: String }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Error> {
//!     let app = Router::new()
//!         .get("/users/:userId/orders/:orderId", get_order)
//!         .post("/register", register)
//!         .get("/user", |_req: Request| async {
//!             Json(serde_json::json!({ "username": "Lev", "name": "Lev Tempest" }))
//!         });
//!
//!     Server::bind("0.0.0.0:3000")?.serve(app).await
//! }
//!
//! async fn get_order(req: Request) -> String {
//!     let user = req.param("userId").unwrap_or_default();
//!     let order = req.param("orderId").unwrap_or_default();
//!     format!("Get user {user} orders {order}")
//! }
//!
//! // JSON, XML, form or multipart: the Content-Type header decides.
//! async fn register(req: Request) -> Result<String, Error> {
//!     let body: Register = req.parse_body().await?;
//!     Ok(format!("Register success, username: {}", body.username))
//! }
//! ```

mod config;
mod decode;
mod error;
mod handler;
mod multipart;
mod request;
mod response;
mod router;
mod server;

pub mod app;
pub mod middleware;

pub use config::{AppConfig, ServerConfig};
pub use decode::{decode, BodyKind};
pub use error::{DecodeError, Error};
pub use handler::{Handler, State};
pub use middleware::Middleware;
pub use multipart::{FormFile, Multipart};
pub use request::Request;
pub use response::{ContentType, IntoResponse, Json, Response, ResponseBuilder, Xml};
pub use router::{Group, Params, Router};
pub use server::Server;
