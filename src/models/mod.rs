mod category;
mod image;
mod post;
mod reaction;
mod user;

pub use category::*;
pub use image::*;
pub use post::*;
pub use reaction::*;
pub use user::*;
