pub mod image;
pub mod project;
pub mod tag;
pub mod work;
pub mod work_tag;
