pub mod backend;
pub mod credentials;
