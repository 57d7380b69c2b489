pub mod routes;

pub use routes::resource_routes;
