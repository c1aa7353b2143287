pub mod pagination;
pub mod picker;
pub mod resource;
pub mod tag;
pub mod view;
