pub mod auth;
pub mod form;
