pub mod movie;
pub mod rating;
pub mod stored_file;
pub mod user;
