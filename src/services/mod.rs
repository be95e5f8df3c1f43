pub mod cache;
pub mod revalidation;
pub mod webhook;
