pub mod post;

pub use self::post::{Post, PostMeta};
