pub mod posts;
pub mod revalidate;
pub mod webhook;
