mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{Harness, bare, json_request};
use tavola::domain::pages::PageKey;

async fn seeded() -> (Harness, String) {
    let harness = Harness::new();
    harness
        .content
        .seed(
            PageKey::Homepage,
            json!({
                "customers": { "title": "Friends", "logos": ["/a.png", "/b.png", "/c.png"] },
                "carousel": { "images": ["/one.jpg", "/two.jpg"] }
            }),
        )
        .await;
    let cookie = harness.login().await;
    (harness, cookie)
}

#[tokio::test]
async fn reorder_replaces_the_collection_order() {
    let (harness, cookie) = seeded().await;

    let request = json_request(
        Method::PUT,
        "/api/pages/homepage/collections/customers/reorder",
        Some(&cookie),
        &json!({ "logos": ["/c.png", "/a.png", "/b.png"] }),
    );
    let (status, body) = harness.send(request).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(
        body["content"]["customers"]["logos"],
        json!(["/c.png", "/a.png", "/b.png"])
    );
    assert_eq!(body["content"]["customers"]["title"], "Friends");

    let stored = harness
        .content
        .stored(PageKey::Homepage)
        .await
        .expect("stored");
    assert_eq!(stored["customers"]["logos"], json!(["/c.png", "/a.png", "/b.png"]));
    assert_eq!(stored["carousel"]["images"], json!(["/one.jpg", "/two.jpg"]));
}

#[tokio::test]
async fn duplicate_identifiers_are_refused() {
    let (harness, cookie) = seeded().await;
    let before = harness.content.stored_bytes(PageKey::Homepage).await;

    let request = json_request(
        Method::PUT,
        "/api/pages/homepage/collections/carousel/reorder",
        Some(&cookie),
        &json!({ "images": ["/one.jpg", "/one.jpg"] }),
    );
    let (status, body) = harness.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");
    assert_eq!(harness.content.stored_bytes(PageKey::Homepage).await, before);
}

#[tokio::test]
async fn reorder_requires_the_collection_field() {
    let (harness, cookie) = seeded().await;

    let request = json_request(
        Method::PUT,
        "/api/pages/homepage/collections/customers/reorder",
        Some(&cookie),
        &json!({ "images": ["/c.png"] }),
    );
    let (status, _) = harness.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let request = json_request(
        Method::PUT,
        "/api/pages/homepage/collections/customers/reorder",
        Some(&cookie),
        &json!({ "logos": [1, 2] }),
    );
    let (status, _) = harness.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_removes_one_element() {
    let (harness, cookie) = seeded().await;

    let request = bare(
        Method::DELETE,
        "/api/pages/homepage/collections/customers/1",
        Some(&cookie),
    );
    let (status, body) = harness.send(request).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(
        body["content"]["customers"]["logos"],
        json!(["/a.png", "/c.png"])
    );
}

#[tokio::test]
async fn out_of_range_deletes_leave_the_page_alone() {
    let (harness, cookie) = seeded().await;
    let before = harness.content.stored_bytes(PageKey::Homepage).await;

    for uri in [
        "/api/pages/homepage/collections/customers/3",
        "/api/pages/homepage/collections/customers/-1",
        "/api/pages/homepage/collections/customers/first",
    ] {
        let (status, body) = harness.send(bare(Method::DELETE, uri, Some(&cookie))).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body["error"]["code"], "not_found");
    }

    assert_eq!(harness.content.stored_bytes(PageKey::Homepage).await, before);
    assert_eq!(harness.content.saves(), 0);
}

#[tokio::test]
async fn unknown_collections_are_not_found() {
    let (harness, cookie) = seeded().await;

    for uri in [
        "/api/pages/homepage/collections/gallery/reorder",
        "/api/pages/about/collections/customers/reorder",
    ] {
        let request = json_request(Method::PUT, uri, Some(&cookie), &json!({ "logos": [] }));
        let (status, _) = harness.send(request).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
    }
}

#[tokio::test]
async fn collection_writes_require_a_session() {
    let (harness, _) = seeded().await;

    let request = json_request(
        Method::PUT,
        "/api/pages/homepage/collections/customers/reorder",
        None,
        &json!({ "logos": ["/c.png", "/b.png", "/a.png"] }),
    );
    let (status, _) = harness.send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = bare(
        Method::DELETE,
        "/api/pages/homepage/collections/customers/0",
        None,
    );
    let (status, _) = harness.send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(harness.content.saves(), 0);
}
