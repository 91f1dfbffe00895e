use chrono::{TimeZone, Utc};
use newsroom_core::{normalize, Category, IdentityKey, RawItem};
use pretty_assertions::assert_eq;

fn raw(link: &str) -> RawItem {
    RawItem {
        title: "Compose gets watch mode".to_string(),
        link: link.to_string(),
        published_at: Utc.with_ymd_and_hms(2024, 2, 1, 8, 0, 0).unwrap(),
        summary_html: "<p>Short <b>summary</b> of the\n release.</p>".to_string(),
        candidate_image_url: Some("https://cdn.example.com/hero.png".to_string()),
        source_endpoint: "https://www.docker.com/blog/feed/".to_string(),
        local_image: None,
    }
}

#[test]
fn extracted_content_becomes_body_with_attribution_footer() {
    let now = Utc.with_ymd_and_hms(2024, 2, 2, 9, 30, 0).unwrap();
    let post = normalize(
        &raw("https://docker.com/blog/watch"),
        Some("# Watch mode\n\nFull article text."),
        Category::Docker,
        0,
        now,
    );

    assert!(post.body_markdown.starts_with("# Watch mode\n\nFull article text."));
    assert!(post
        .body_markdown
        .contains("Source: [https://www.docker.com/blog/feed/](https://docker.com/blog/watch)"));
    assert!(post.body_markdown.contains("Category: Docker\n"));
    assert!(post
        .body_markdown
        .contains("Tags: cloud-native, container, containers, docker, docker-compose, dockerhub\n"));
    assert_eq!(post.excerpt, "Short summary of the release.");
    assert_eq!(post.title, "Docker: Compose gets watch mode - Feb 02, 2024");
    assert_eq!(post.post_id, "docker_0_20240202_093000");
    assert_eq!(post.created_at, now);
    assert_eq!(
        post.remote_image_url.as_deref(),
        Some("https://cdn.example.com/hero.png")
    );
}

#[test]
fn missing_extraction_falls_back_to_summary() {
    let now = Utc.with_ymd_and_hms(2024, 2, 2, 9, 30, 0).unwrap();
    let post = normalize(&raw("https://docker.com/blog/watch"), None, Category::Docker, 1, now);
    assert!(post.body_markdown.starts_with("Short summary of the release.\n\n---\n\n"));

    let blank = normalize(
        &raw("https://docker.com/blog/watch"),
        Some("   \n"),
        Category::Docker,
        1,
        now,
    );
    assert_eq!(blank.body_markdown, post.body_markdown);
}

#[test]
fn identity_ignores_title_time_and_tracking_noise() {
    let first = normalize(
        &raw("https://docker.com/blog/a?utm_source=x"),
        None,
        Category::Docker,
        0,
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    );
    let mut other = raw("https://docker.com/blog/a/");
    other.title = "A different headline".to_string();
    let second = normalize(
        &other,
        Some("changed body"),
        Category::Container,
        5,
        Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(),
    );

    assert_eq!(first.identity_key, second.identity_key);
    assert_eq!(first.identity_key, IdentityKey::from_link("https://docker.com/blog/a"));
    assert_ne!(first.body_markdown, second.body_markdown);
}

#[test]
fn kubernetes_tags_do_not_duplicate_cloud_native() {
    let post = normalize(
        &raw("https://kubernetes.io/blog/x"),
        None,
        Category::Kubernetes,
        0,
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    );
    let tags: Vec<_> = post.tags.iter().map(String::as_str).collect();
    assert_eq!(
        tags,
        vec!["cloud-native", "cncf", "container", "k8s", "kubernetes"]
    );
}
