pub mod api;
pub mod domain;
pub mod event;
pub mod row;

pub use api::*;
pub use domain::*;
pub use event::*;
pub use row::{posts_from_rows, PostRow};
