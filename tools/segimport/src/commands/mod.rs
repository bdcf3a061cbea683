pub mod import;
pub mod register;
pub mod schema;
pub mod stats;
