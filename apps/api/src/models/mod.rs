pub mod feedback;
pub mod job;
pub mod persona;
pub mod schema;
