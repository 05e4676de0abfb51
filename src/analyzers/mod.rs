pub mod exceptions;
pub mod summary;
