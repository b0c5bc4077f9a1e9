pub mod entities;
pub mod enums;
pub mod models;
pub mod query;
pub mod schema;
pub mod services;
