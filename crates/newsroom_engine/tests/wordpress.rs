use newsroom_engine::{
    ContentTarget, Credentials, FetchSettings, PostDraft, RemoteApiFailure, WordPressClient,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> WordPressClient {
    let creds = Credentials::new("editor", "app-pass", &server.uri()).unwrap();
    WordPressClient::new(creds, &FetchSettings::default()).unwrap()
}

#[tokio::test]
async fn existing_category_is_matched_case_insensitively() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/categories"))
        .and(query_param("search", "Docker"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 4, "name": "Docker Desktop"},
            {"id": 9, "name": "docker"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/wp-json/wp/v2/categories"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    assert_eq!(client(&server).category_id("Docker").await.unwrap(), 9);
}

#[tokio::test]
async fn missing_tag_is_created() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/wp-json/wp/v2/tags"))
        .and(body_json(json!({"name": "k8s"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 31, "name": "k8s"})))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(client(&server).tag_id("k8s").await.unwrap(), 31);
}

#[tokio::test]
async fn term_exists_conflict_yields_existing_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/tags"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/wp-json/wp/v2/tags"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": "term_exists",
            "message": "A term with the name provided already exists.",
            "data": {"status": 400, "term_id": 12}
        })))
        .mount(&server)
        .await;

    assert_eq!(client(&server).tag_id("cncf").await.unwrap(), 12);
}

#[tokio::test]
async fn media_upload_sends_file_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/wp-json/wp/v2/media"))
        .and(header("content-type", "image/png"))
        .and(header("content-disposition", "attachment; filename=hero.png"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 55})))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("hero.png");
    std::fs::write(&image, [1u8, 2, 3]).unwrap();

    assert_eq!(client(&server).upload_media(&image).await.unwrap(), 55);
}

#[tokio::test]
async fn rejected_post_reports_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/wp-json/wp/v2/posts"))
        .respond_with(ResponseTemplate::new(401).set_body_string("rest_cannot_create"))
        .mount(&server)
        .await;

    let draft = PostDraft {
        title: "Docker: Hello - Jan 01, 2024".into(),
        content: "body".into(),
        excerpt: "excerpt".into(),
        status: "publish",
        categories: vec![],
        tags: vec![],
        featured_media: None,
    };
    let err = client(&server).create_post(&draft).await.unwrap_err();
    match err {
        RemoteApiFailure::Status { status, body, .. } => {
            assert_eq!(status, 401);
            assert_eq!(body, "rest_cannot_create");
        }
        other => panic!("unexpected failure {other:?}"),
    }
}

#[tokio::test]
async fn created_post_returns_id_and_link() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/wp-json/wp/v2/posts"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 812,
            "link": "https://news.example.com/2024/01/hello/",
            "status": "publish"
        })))
        .mount(&server)
        .await;

    let draft = PostDraft {
        title: "t".into(),
        content: "c".into(),
        excerpt: "e".into(),
        status: "publish",
        categories: vec![2],
        tags: vec![3, 4],
        featured_media: Some(55),
    };
    let post = client(&server).create_post(&draft).await.unwrap();
    assert_eq!(post.id, 812);
    assert_eq!(post.link, "https://news.example.com/2024/01/hello/");
}
