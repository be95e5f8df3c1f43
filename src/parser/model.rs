use serde::Deserialize;

#[derive(Deserialize, Debug, Default, Clone)]
pub struct PostFrontMatter {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub date: Option<String>,
    pub tags: Option<Vec<String>>,
    pub published: Option<bool>,
    pub description: Option<String>,
}
