pub mod error;
pub mod extract;
pub mod response;
pub mod time;
pub mod upload;
