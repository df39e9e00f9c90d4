pub mod project;
pub mod shared;
pub mod work;
