pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod series;
pub mod sync;

pub use routes::create_router;
