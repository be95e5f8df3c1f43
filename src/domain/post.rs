use chrono::NaiveDate;
use serde::Serialize;

/// Listing entry built from a post's front matter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostMeta {
    pub slug: String,
    pub title: String,
    pub date: Option<NaiveDate>,
    pub tags: Vec<String>,
    pub published: bool,
    pub description: Option<String>,
    // repository path of the source file, e.g. "posts/hello.md"
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Post {
    #[serde(flatten)]
    pub meta: PostMeta,
    pub md_content: String,
    pub html_content: String,
}
