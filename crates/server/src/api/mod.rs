pub mod action;
pub mod competitors;
pub mod handlers;
pub mod middleware;
pub mod preparation;
pub mod reports;
pub mod results;
pub mod routes;
pub mod settings;
pub mod ws;

pub use routes::create_router;
