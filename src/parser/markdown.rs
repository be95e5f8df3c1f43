use crate::domain::PostMeta;
use crate::parser::model::PostFrontMatter;
use anyhow::{Result, anyhow};
use chrono::NaiveDate;
use gray_matter::{Matter, engine::YAML};
use pulldown_cmark::{Event, Options as CmarkOptions, Parser, Tag, html};

// extracts YAML frontmatter and returns the typed metadata alongside the raw markdown body
pub fn extract_frontmatter(md_content: &str, path: &str) -> Result<(PostFrontMatter, String)> {
    let matter = Matter::<YAML>::new();

    let parsed_matter = matter
        .parse::<PostFrontMatter>(md_content)
        .map_err(|e| anyhow!("Failed to parse frontmatter in {}: {}", path, e))?;

    let frontmatter = parsed_matter.data.unwrap_or_default();

    Ok((frontmatter, parsed_matter.content))
}

/// Builds the listing entry for a post file.
///
/// The slug comes from the frontmatter when present, otherwise from the file name
/// without its `.md` extension. Posts without a `published` flag count as published.
pub fn build_post_meta(frontmatter: PostFrontMatter, path: &str) -> PostMeta {
    let slug = frontmatter
        .slug
        .unwrap_or_else(|| slug_from_path(path));

    PostMeta {
        title: frontmatter.title.unwrap_or_else(|| slug.clone()),
        date: frontmatter.date.as_deref().and_then(parse_post_date),
        tags: frontmatter.tags.unwrap_or_default(),
        published: frontmatter.published.unwrap_or(true),
        description: frontmatter.description,
        path: path.to_string(),
        slug,
    }
}

pub fn slug_from_path(path: &str) -> String {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    file_name
        .strip_suffix(".md")
        .unwrap_or(file_name)
        .to_string()
}

fn parse_post_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();

    // attempt to parse RFC3339
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }

    // fallback to YYYY-MM-DD
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// Rewrites relative links to sibling markdown files into post routes.
pub fn resolve_post_link(link: &str) -> String {
    if link.contains("://") || link.starts_with("mailto:") || link.starts_with('#') {
        return link.to_string();
    }

    let (target, fragment) = match link.split_once('#') {
        Some((target, fragment)) => (target, format!("#{}", fragment)),
        None => (link, String::new()),
    };

    if target.ends_with(".md") {
        format!("/api/posts/{}{}", slug_from_path(target), fragment)
    } else {
        link.to_string()
    }
}

// compiles markdown content into HTML, and resolves links on-the-fly using the provided resolver
pub fn compile_markdown_to_html<F>(markdown_content: &str, mut resolver: F) -> Result<String>
where
    F: FnMut(&str) -> String,
{
    let mut options = CmarkOptions::empty();
    options.insert(CmarkOptions::ENABLE_STRIKETHROUGH);
    options.insert(CmarkOptions::ENABLE_TABLES);

    let parser = Parser::new_ext(markdown_content, options);

    let mut html_content = String::new();

    let event_iterator = parser.map(|event| {
        if let Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) = event
        {
            let new_url = resolver(&dest_url);
            Event::Start(Tag::Link {
                link_type,
                dest_url: new_url.into(),
                title,
                id,
            })
        } else {
            event
        }
    });

    html::push_html(&mut html_content, event_iterator);

    Ok(html_content)
}
