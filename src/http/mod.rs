//! HTTP surface of the service.
//!
//! Three routes, one of substance:
//!
//! | Method | Path | Purpose |
//! |--------|------|---------|
//! | POST | `/extract` | multipart PDF upload → extracted invoice JSON |
//! | GET  | `/health`  | liveness probe |
//! | GET  | `/docs`    | static API description |
//!
//! [`routes::create_router`] assembles the router; [`extract`] holds the
//! endpoint handler; [`middleware`] attaches a request id and timing to every
//! request.

pub mod extract;
pub mod middleware;
pub mod routes;

pub use routes::create_router;
