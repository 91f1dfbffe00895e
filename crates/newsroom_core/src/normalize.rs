use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use scraper::Html;

use crate::identity::IdentityKey;
use crate::model::{Category, Post, RawItem};

const SHARED_TAGS: &[&str] = &["container", "cloud-native"];
pub const MAX_EXCERPT_CHARS: usize = 400;
const EXCERPT_MARKER: &str = "...";

/// Builds the canonical post for one raw item.
///
/// Pure apart from `now`, which stamps the title, the record id and `created_at`.
/// `extracted` is the full article text when extraction succeeded; otherwise the
/// summary is used for the body.
pub fn normalize(
    raw: &RawItem,
    extracted: Option<&str>,
    category: Category,
    index: usize,
    now: DateTime<Utc>,
) -> Post {
    let tags = tags_for(category);
    let excerpt = excerpt_from_summary(&raw.summary_html);
    let body_markdown = build_body(raw, extracted, &excerpt, category, &tags);

    Post {
        post_id: post_id(category, index, now),
        identity_key: IdentityKey::from_link(&raw.link),
        title: format_title(&raw.title, category, now),
        body_markdown,
        excerpt,
        category,
        tags,
        local_image_path: raw.local_image.clone(),
        remote_image_url: raw.candidate_image_url.clone(),
        source_link: raw.link.clone(),
        created_at: now,
    }
}

/// `"{Category}: {title} - {Mon DD, YYYY}"`, skipping the prefix when the title
/// already mentions the category (case-insensitive substring heuristic).
pub fn format_title(title: &str, category: Category, now: DateTime<Utc>) -> String {
    let title = title.trim();
    let prefixed = if title.to_lowercase().contains(category.name()) {
        title.to_string()
    } else {
        format!("{}: {}", category.display_name(), title)
    };
    format!("{prefixed} - {}", now.format("%b %d, %Y"))
}

pub fn tags_for(category: Category) -> BTreeSet<String> {
    std::iter::once(category.name())
        .chain(SHARED_TAGS.iter().copied())
        .chain(category.extra_tags().iter().copied())
        .map(str::to_string)
        .collect()
}

pub fn post_id(category: Category, index: usize, now: DateTime<Utc>) -> String {
    format!("{}_{}_{}", category.name(), index, now.format("%Y%m%d_%H%M%S"))
}

/// Visible text of an HTML fragment with whitespace collapsed.
pub fn summary_text(summary_html: &str) -> String {
    let fragment = Html::parse_fragment(summary_html);
    let text: String = fragment.root_element().text().collect();
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn excerpt_from_summary(summary_html: &str) -> String {
    let text = summary_text(summary_html);
    if text.chars().count() <= MAX_EXCERPT_CHARS {
        return text;
    }
    let cut: String = text.chars().take(MAX_EXCERPT_CHARS).collect();
    let cut = match cut.rfind(' ') {
        Some(idx) if idx > MAX_EXCERPT_CHARS / 2 => &cut[..idx],
        _ => cut.as_str(),
    };
    format!("{}{EXCERPT_MARKER}", cut.trim_end())
}

fn build_body(
    raw: &RawItem,
    extracted: Option<&str>,
    excerpt: &str,
    category: Category,
    tags: &BTreeSet<String>,
) -> String {
    let content = extracted
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .unwrap_or(excerpt);
    let tag_line = tags.iter().map(String::as_str).collect::<Vec<_>>().join(", ");
    format!(
        "{content}\n\n---\n\nSource: [{source}]({link})\n\n\nCategory: {category}\nTags: {tag_line}\n",
        source = raw.source_endpoint,
        link = raw.link,
        category = category.display_name(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap()
    }

    #[test]
    fn title_gets_prefix_and_date() {
        assert_eq!(
            format_title("Compose v3 ships", Category::Docker, now()),
            "Docker: Compose v3 ships - Mar 05, 2024"
        );
    }

    #[test]
    fn title_mentioning_category_is_not_prefixed() {
        assert_eq!(
            format_title("What's new in KUBERNETES 1.30", Category::Kubernetes, now()),
            "What's new in KUBERNETES 1.30 - Mar 05, 2024"
        );
    }

    #[test]
    fn excerpt_is_truncated_on_a_word_boundary() {
        let long = "word ".repeat(200);
        let excerpt = excerpt_from_summary(&long);
        assert!(excerpt.ends_with("..."));
        assert!(excerpt.chars().count() <= MAX_EXCERPT_CHARS + EXCERPT_MARKER.len());
        assert!(!excerpt.contains("wor..."));
    }

    #[test]
    fn post_id_uses_compact_stamp() {
        assert_eq!(post_id(Category::Container, 2, now()), "container_2_20240305_140709");
    }
}
