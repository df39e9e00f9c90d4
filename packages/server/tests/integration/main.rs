
mod auth;
mod project;
mod work;
