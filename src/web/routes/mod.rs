pub mod health_routes;
pub mod todo_routes;
