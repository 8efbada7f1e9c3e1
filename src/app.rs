//! The demo application: one route per framework feature.
//!
//! ```text
//! GET  /                                  Hello, World!
//! GET  /hello?name=Lev                    query parameter, defaults to "guest"
//! GET  /request                           header `firstname` + cookie `lastname`
//! GET  /users/:userId/orders/:orderId     path parameters
//! POST /hello                             form field `name`
//! POST /upload                            multipart file `file`, saved to disk
//! POST /login                             raw JSON body
//! POST /register                          JSON, XML, form or multipart body
//! GET  /user                              JSON response
//! GET  /download                          file download
//! GET  /api/{hello,world}, /web/{hello,world}
//! ```

use std::sync::Arc;

use serde::Deserialize;

use crate::config::AppConfig;
use crate::error::Error;
use crate::handler::State;
use crate::middleware;
use crate::request::Request;
use crate::response::{Json, Response};
use crate::router::Router;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub name: String,
}

/// Builds the demo router. Files go where `config` says.
pub fn router(config: AppConfig) -> Router {
    Router::new()
        .with_state(Arc::new(config))
        .wrap(middleware::Trace)
        .get("/", hello_world)
        .get("/hello", hello)
        .get("/request", request_info)
        .get("/users/:userId/orders/:orderId", user_order)
        .post("/hello", hello_form)
        .post("/upload", upload)
        .post("/login", login)
        .post("/register", register)
        .get("/user", user)
        .get("/download", download)
        .group("/api", |api| api.get("/hello", hello_world).get("/world", hello_world))
        .group("/web", |web| web.get("/hello", hello_world).get("/world", hello_world))
}

async fn hello_world(_req: Request) -> &'static str {
    "Hello, World!"
}

async fn hello(req: Request) -> String {
    format!("Hello, {}!", req.query_or("name", "guest"))
}

async fn request_info(req: Request) -> String {
    let first = req.header("firstname").unwrap_or_default();
    let last = req.cookie("lastname").unwrap_or_default();
    format!("Hello, {first} {last}!")
}

async fn user_order(req: Request) -> String {
    let user = req.param("userId").unwrap_or_default();
    let order = req.param("orderId").unwrap_or_default();
    format!("Get user {user} orders {order}")
}

async fn hello_form(req: Request) -> Result<String, Error> {
    let name = req.form_value("name").await?.unwrap_or_default();
    Ok(format!("Hello, {name}!"))
}

async fn upload(req: Request, State(config): State<Arc<AppConfig>>) -> Result<&'static str, Error> {
    let file = req.form_file("file").await?;
    tokio::fs::create_dir_all(&config.upload_dir).await?;
    let path = file.save_into(&config.upload_dir).await?;
    tracing::info!(path = %path.display(), bytes = file.len(), "upload saved");
    Ok("Upload Success")
}

async fn login(req: Request) -> Result<String, Error> {
    let login: LoginRequest = req.json()?;
    Ok(format!("Hello, {}!", login.username))
}

async fn register(req: Request) -> Result<String, Error> {
    let register: RegisterRequest = req.parse_body().await?;
    Ok(format!("Register success, username: {}", register.username))
}

async fn user(_req: Request) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "username": "Lev",
        "name": "Lev Tempest",
    }))
}

async fn download(_req: Request, State(config): State<Arc<AppConfig>>) -> Result<Response, Error> {
    Response::download(&config.download_file, "contoh-downloaded.txt").await
}
