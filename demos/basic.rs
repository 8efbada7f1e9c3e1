//! Minimal senda example: a JSON resource with path parameters, a body
//! that may arrive as JSON, XML or a form, and request logging.
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/users/42
//!   curl -X POST http://localhost:3000/users \
//!        -H 'content-type: application/json' -d '{"name":"alice"}'
//!   curl -X POST http://localhost:3000/users -d 'name=alice'
//!   curl -X DELETE http://localhost:3000/users/42

use http::{HeaderValue, StatusCode};
use senda::{middleware, Error, Json, Request, Response, Router, Server};
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize)]
struct User {
    #[serde(default)]
    id: String,
    name: String,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt::init();

    let app = Router::new()
        .wrap(middleware::Trace)
        .get("/users/:id", get_user)
        .post("/users", create_user)
        .delete("/users/:id", delete_user);

    Server::bind("0.0.0.0:3000")?.serve(app).await
}

// GET /users/:id
async fn get_user(req: Request) -> Json<User> {
    let id = req.param("id").unwrap_or("unknown").to_owned();
    Json(User { id, name: "alice".into() })
}

// POST /users. The Content-Type header picks the decoder.
async fn create_user(req: Request) -> Result<Response, Error> {
    let user: User = req.parse_body().await?;
    let body = serde_json::json!({ "id": "99", "name": user.name });

    Ok(Response::builder()
        .status(StatusCode::CREATED)
        .header("location", HeaderValue::from_static("/users/99"))
        .json(body.to_string()))
}

// DELETE /users/:id → 204 No Content
async fn delete_user(_req: Request) -> StatusCode {
    StatusCode::NO_CONTENT
}
