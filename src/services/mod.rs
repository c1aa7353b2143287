pub mod comment_service;
pub mod lister;
pub mod picker_service;
pub mod preview_queue;
pub mod tag_service;
pub mod view_service;
