//! Request dispatch exercised through the public entry point, against a real
//! directory tree.

use bytes::Bytes;
use fileman::convert::{NameConverter, Node, Sha256Converter, SizeConverter};
use fileman::extract::ByteExtractor;
use fileman::format::JsonFormatter;
use fileman::{handle_request, Converter, Fileman};
use http_body_util::{BodyExt, Full};
use hyper::header::{
    ACCEPT_RANGES, ALLOW, CONTENT_DISPOSITION, CONTENT_RANGE, CONTENT_TYPE, LOCATION, RANGE,
};
use hyper::{Request, Response, StatusCode};
use tempfile::TempDir;

const DIGITS: &str = "01234567890123456789012345678901234567890123456789";

fn tree() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("a.txt"), "0123456789").unwrap();
    std::fs::write(dir.path().join("digits.txt"), DIGITS).unwrap();
    std::fs::create_dir(dir.path().join("b")).unwrap();
    std::fs::write(dir.path().join("b/inner.txt"), "inner").unwrap();
    dir
}

fn fileman(dir: &TempDir) -> Fileman {
    Fileman::builder(dir.path())
        .servlet_path("/files")
        .converter(Box::new(NameConverter))
        .converter(Box::new(SizeConverter))
        .extractor(Box::new(ByteExtractor))
        .formatter(Box::new(JsonFormatter))
        .build()
        .unwrap()
}

fn request(method: &str, uri: &str) -> Request<Full<Bytes>> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Full::new(Bytes::new()))
        .unwrap()
}

async fn body_text<B>(resp: Response<B>) -> String
where
    B: hyper::body::Body,
    B::Error: std::fmt::Debug,
{
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn listing_has_configured_columns_in_name_order() {
    let dir = tree();
    let fileman = fileman(&dir);

    let resp = handle_request(request("GET", "/files/"), &fileman).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[CONTENT_TYPE], "application/json");
    let text = body_text(resp).await;

    // Column order follows converter registration
    let a = text.find("\"name\": \"a.txt\"").unwrap();
    let a_size = text[a..].find("\"size\": \"10\"").unwrap();
    assert!(a_size > 0);

    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["folder"], true);
    let children = value["children"].as_array().unwrap();
    let names: Vec<_> = children
        .iter()
        .map(|c| c["properties"]["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["a.txt", "b", "digits.txt"]);
    assert_eq!(children[0]["uri"], "/files/a.txt");
    assert_eq!(children[1]["folder"], true);
    for child in children {
        let columns: Vec<_> = child["properties"].as_object().unwrap().keys().collect();
        assert_eq!(columns.len(), 2);
    }
}

struct Unreadable;

impl Converter for Unreadable {
    fn column(&self) -> &str {
        "unreadable"
    }

    fn convert(&self, _node: &Node<'_>) -> std::io::Result<String> {
        Err(std::io::Error::other("no access"))
    }
}

#[tokio::test]
async fn listing_hashes_file_content() {
    let dir = tree();
    let fileman = Fileman::builder(dir.path())
        .servlet_path("/files")
        .converter(Box::new(NameConverter))
        .converter(Box::new(Sha256Converter))
        .formatter(Box::new(JsonFormatter))
        .build()
        .unwrap();

    let resp = handle_request(request("GET", "/files/"), &fileman).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let value: serde_json::Value = serde_json::from_str(&body_text(resp).await).unwrap();
    assert_eq!(
        value["children"][0]["properties"]["sha256"],
        "84d89877f0d4041efb6bf91a16f0248f2fd573e6af05c19f96bedb9f882f7882"
    );
}

#[tokio::test]
async fn failing_converter_fails_listing_unless_soft() {
    let dir = tree();
    let strict = Fileman::builder(dir.path())
        .converter(Box::new(NameConverter))
        .converter(Box::new(Unreadable))
        .formatter(Box::new(JsonFormatter))
        .build()
        .unwrap();
    let resp = handle_request(request("GET", "/"), &strict).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let soft = Fileman::builder(dir.path())
        .fail_soft(true)
        .converter(Box::new(NameConverter))
        .converter(Box::new(Unreadable))
        .formatter(Box::new(JsonFormatter))
        .build()
        .unwrap();
    let resp = handle_request(request("GET", "/"), &soft).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let value: serde_json::Value = serde_json::from_str(&body_text(resp).await).unwrap();
    assert_eq!(value["children"][0]["properties"]["unreadable"], "");
}

#[tokio::test]
async fn folder_without_trailing_slash_redirects() {
    let dir = tree();
    let fileman = Fileman::builder(dir.path())
        .servlet_path("/files")
        .converter(Box::new(NameConverter))
        .build()
        .unwrap();

    let resp = handle_request(request("GET", "/files/b"), &fileman).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(resp.headers()[LOCATION], "/files/b/");
    assert!(body_text(resp).await.is_empty());

    let resp = handle_request(request("GET", "/files/b/"), &fileman).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains("inner.txt"));
}

#[tokio::test]
async fn outside_mount_is_not_found() {
    let dir = tree();
    let fileman = fileman(&dir);
    let resp = handle_request(request("GET", "/other/a.txt"), &fileman).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn whole_download_streams_file_as_attachment() {
    let dir = tree();
    let fileman = fileman(&dir);

    let resp = handle_request(request("GET", "/files/a.txt"), &fileman).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()[CONTENT_DISPOSITION],
        "attachment; filename=\"a.txt\""
    );
    assert_eq!(resp.headers()[ACCEPT_RANGES], "bytes");
    assert_eq!(body_text(resp).await, "0123456789");
}

#[tokio::test]
async fn single_range_is_partial_content() {
    let dir = tree();
    let fileman = fileman(&dir);

    let mut req = request("GET", "/files/digits.txt");
    req.headers_mut().insert(RANGE, "bytes=10-19".parse().unwrap());
    let resp = handle_request(req, &fileman).await;
    assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(resp.headers()[CONTENT_RANGE], "bytes 10-19/50");
    assert_eq!(body_text(resp).await, &DIGITS[10..20]);

    let mut req = request("GET", "/files/digits.txt");
    req.headers_mut().insert(RANGE, "bytes=-5".parse().unwrap());
    let resp = handle_request(req, &fileman).await;
    assert_eq!(resp.headers()[CONTENT_RANGE], "bytes 45-49/50");
    assert_eq!(body_text(resp).await, &DIGITS[45..]);
}

#[tokio::test]
async fn unsatisfiable_range_is_416() {
    let dir = tree();
    let fileman = fileman(&dir);

    let mut req = request("GET", "/files/digits.txt");
    req.headers_mut().insert(RANGE, "bytes=100-200".parse().unwrap());
    let resp = handle_request(req, &fileman).await;
    assert_eq!(resp.status(), StatusCode::RANGE_NOT_SATISFIABLE);
    assert_eq!(resp.headers()[CONTENT_RANGE], "bytes */50");
}

#[tokio::test]
async fn multi_range_without_extractor_is_501() {
    let dir = tree();
    let fileman = fileman(&dir);

    let mut req = request("GET", "/files/digits.txt");
    req.headers_mut()
        .insert(RANGE, "bytes=0-1,5-6".parse().unwrap());
    let resp = handle_request(req, &fileman).await;
    assert_eq!(resp.status(), StatusCode::NOT_IMPLEMENTED);
}

#[tokio::test]
async fn multi_range_with_unsatisfiable_member_is_501() {
    let dir = tree();
    let fileman = fileman(&dir);

    let mut req = request("GET", "/files/digits.txt");
    req.headers_mut()
        .insert(RANGE, "bytes=0-1,100-200".parse().unwrap());
    let resp = handle_request(req, &fileman).await;
    assert_eq!(resp.status(), StatusCode::NOT_IMPLEMENTED);

    // Only when no member fits is the set unsatisfiable
    let mut req = request("GET", "/files/digits.txt");
    req.headers_mut()
        .insert(RANGE, "bytes=60-70,100-200".parse().unwrap());
    let resp = handle_request(req, &fileman).await;
    assert_eq!(resp.status(), StatusCode::RANGE_NOT_SATISFIABLE);
}

#[tokio::test]
async fn listing_through_dot_segments_uses_clean_paths() {
    let dir = tree();
    let fileman = fileman(&dir);

    let resp = handle_request(request("GET", "/files/a/../b/"), &fileman).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let value: serde_json::Value = serde_json::from_str(&body_text(resp).await).unwrap();
    assert_eq!(value["uri"], "/files/b");
    assert_eq!(value["children"][0]["uri"], "/files/b/inner.txt");
}

#[tokio::test]
async fn post_unnamed_part_gets_generated_name() {
    let dir = tree();
    let fileman = fileman(&dir);

    let body = "--XyZ\r\n\
                Content-Disposition: form-data; name=\"file\"\r\n\
                \r\n\
                payload\r\n\
                --XyZ--\r\n";
    let req = Request::builder()
        .method("POST")
        .uri("/files/b")
        .header(CONTENT_TYPE, "multipart/form-data; boundary=XyZ")
        .body(Full::new(Bytes::from(body)))
        .unwrap();
    let resp = handle_request(req, &fileman).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let created: Vec<_> = std::fs::read_dir(dir.path().join("b"))
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .filter(|name| name != "inner.txt")
        .collect();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].len(), 32);
    assert!(created[0].chars().all(|c| c.is_ascii_hexdigit()));
    let written = std::fs::read_to_string(dir.path().join("b").join(&created[0])).unwrap();
    assert_eq!(written, "payload");
}

#[tokio::test]
async fn put_creates_file_and_refuses_folder() {
    let dir = tree();
    let fileman = fileman(&dir);

    let req = Request::builder()
        .method("PUT")
        .uri("/files/new/c.txt")
        .body(Full::new(Bytes::from_static(b"fresh")))
        .unwrap();
    let resp = handle_request(req, &fileman).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        std::fs::read_to_string(dir.path().join("new/c.txt")).unwrap(),
        "fresh"
    );

    let req = Request::builder()
        .method("PUT")
        .uri("/files/b")
        .body(Full::new(Bytes::from_static(b"fresh")))
        .unwrap();
    let resp = handle_request(req, &fileman).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert!(dir.path().join("b/inner.txt").exists());
}

#[tokio::test]
async fn delete_removes_and_reports_missing() {
    let dir = tree();
    let fileman = fileman(&dir);

    let resp = handle_request(request("DELETE", "/files/b"), &fileman).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(!dir.path().join("b").exists());

    let resp = handle_request(request("DELETE", "/files/b"), &fileman).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_spelling_the_root_is_refused() {
    let dir = tree();
    let fileman = fileman(&dir);

    for uri in ["/files/b/..", "/files/%2e", "/files/.", "/files/b/%2E%2E/"] {
        let resp = handle_request(request("DELETE", uri), &fileman).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT, "{uri}");
    }
    assert!(dir.path().join("a.txt").exists());
    assert!(dir.path().join("b/inner.txt").exists());

    let resp = handle_request(request("DELETE", "/files/.."), &fileman).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert!(dir.path().join("a.txt").exists());
}

#[tokio::test]
async fn unregistered_verb_is_405() {
    let dir = tree();
    let fileman = fileman(&dir);

    let resp = handle_request(request("PROPFIND", "/files/"), &fileman).await;
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(
        resp.headers()[ALLOW],
        "GET, POST, PUT, DELETE, OPTIONS, TRACE"
    );
}
