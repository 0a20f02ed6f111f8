mod group;
mod post;
mod user;

pub use group::*;
pub use post::*;
pub use user::*;
