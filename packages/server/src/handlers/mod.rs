pub mod project;
pub mod tag;
pub mod work;
