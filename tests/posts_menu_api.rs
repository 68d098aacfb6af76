mod common;

use axum::http::{Method, StatusCode};
use serde_json::{Value, json};

use common::{Harness, bare, get, json_request};

async fn create_post(harness: &Harness, cookie: &str, body: Value) -> Value {
    let (status, post) = harness
        .send(json_request(Method::POST, "/api/posts", Some(cookie), &body))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{post}");
    post
}

async fn create_dish(harness: &Harness, cookie: &str, category: &str, name: &str) -> Value {
    let body = json!({ "category": category, "name": name, "price_cents": 1250 });
    let (status, item) = harness
        .send(json_request(Method::POST, "/api/menu", Some(cookie), &body))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{item}");
    item
}

fn ids(list: &Value) -> Vec<i64> {
    list.as_array()
        .expect("array")
        .iter()
        .map(|entry| entry["id"].as_i64().expect("id"))
        .collect()
}

#[tokio::test]
async fn post_slugs_are_derived_and_deduplicated() {
    let harness = Harness::new();
    let cookie = harness.login().await;

    let first = create_post(
        &harness,
        &cookie,
        json!({ "title": "Ramadan Specials!", "published": true }),
    )
    .await;
    assert_eq!(first["slug"], "ramadan-specials");
    assert_eq!(first["position"], 0);

    let second = create_post(
        &harness,
        &cookie,
        json!({ "title": "Ramadan specials", "published": true }),
    )
    .await;
    assert_eq!(second["slug"], "ramadan-specials-2");
    assert_eq!(second["position"], 1);

    let (status, body) = harness
        .send(json_request(
            Method::POST,
            "/api/posts",
            Some(&cookie),
            &json!({ "title": "Other", "slug": "ramadan-specials" }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");

    let (status, _) = harness
        .send(json_request(
            Method::POST,
            "/api/posts",
            Some(&cookie),
            &json!({ "title": "   " }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn drafts_are_hidden_from_visitors() {
    let harness = Harness::new();
    let cookie = harness.login().await;

    let live = create_post(&harness, &cookie, json!({ "title": "Open", "published": true })).await;
    let draft = create_post(&harness, &cookie, json!({ "title": "Soon" })).await;
    assert_eq!(draft["published"], false);

    let (status, body) = harness.send(get("/api/posts")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), [live["id"].as_i64().expect("id")]);

    let draft_uri = format!("/api/posts/{}", draft["id"]);
    let (status, _) = harness.send(get(&draft_uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = harness
        .send(bare(Method::GET, &draft_uri, Some(&cookie)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Soon");

    let (_, body) = harness
        .send(bare(Method::GET, "/api/posts", Some(&cookie)))
        .await;
    assert_eq!(ids(&body).len(), 2);
}

#[tokio::test]
async fn posts_update_reorder_and_delete() {
    let harness = Harness::new();
    let cookie = harness.login().await;

    let a = create_post(&harness, &cookie, json!({ "title": "A", "published": true })).await;
    let b = create_post(&harness, &cookie, json!({ "title": "B", "published": true })).await;
    let c = create_post(&harness, &cookie, json!({ "title": "C", "published": true })).await;
    let (a, b, c) = (
        a["id"].as_i64().expect("id"),
        b["id"].as_i64().expect("id"),
        c["id"].as_i64().expect("id"),
    );

    let (status, body) = harness
        .send(json_request(
            Method::PUT,
            &format!("/api/posts/{b}"),
            Some(&cookie),
            &json!({ "title": "B prime", "slug": "", "body": "fresh", "published": false }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["slug"], "b");
    assert_eq!(body["title"], "B prime");
    assert_eq!(body["published"], false);

    let (status, body) = harness
        .send(json_request(
            Method::PUT,
            "/api/posts/reorder",
            Some(&cookie),
            &json!({ "posts": [c, a, b] }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), [c, a, b]);

    let (status, _) = harness
        .send(json_request(
            Method::PUT,
            "/api/posts/reorder",
            Some(&cookie),
            &json!({ "posts": [c, c] }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let delete_uri = format!("/api/posts/{a}");
    let (status, _) = harness
        .send(bare(Method::DELETE, &delete_uri, Some(&cookie)))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = harness
        .send(bare(Method::DELETE, &delete_uri, Some(&cookie)))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = harness.send(get("/api/posts")).await;
    assert_eq!(ids(&body), [c]);
}

#[tokio::test]
async fn post_writes_require_a_session() {
    let harness = Harness::new();

    let (status, _) = harness
        .send(json_request(
            Method::POST,
            "/api/posts",
            None,
            &json!({ "title": "Nope" }),
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = harness
        .send(bare(Method::DELETE, "/api/posts/1", None))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn menu_items_filter_by_category() {
    let harness = Harness::new();
    let cookie = harness.login().await;

    let soup = create_dish(&harness, &cookie, "starters", "Lentil soup").await;
    let kebab = create_dish(&harness, &cookie, "mains", "Adana kebab").await;
    let salad = create_dish(&harness, &cookie, "starters", "Shepherd salad").await;
    assert_eq!(soup["position"], 0);
    assert_eq!(kebab["position"], 0);
    assert_eq!(salad["position"], 1);
    assert_eq!(salad["available"], true);

    let (status, body) = harness.send(get("/api/menu?category=starters")).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<_> = body
        .as_array()
        .expect("items")
        .iter()
        .map(|item| item["name"].as_str().expect("name"))
        .collect();
    assert_eq!(names, ["Lentil soup", "Shepherd salad"]);

    let (_, body) = harness.send(get("/api/menu")).await;
    assert_eq!(ids(&body).len(), 3);

    let (status, body) = harness
        .send(get(&format!("/api/menu/{}", kebab["id"])))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["category"], "mains");
}

#[tokio::test]
async fn menu_validation_and_missing_items() {
    let harness = Harness::new();
    let cookie = harness.login().await;

    let (status, body) = harness
        .send(json_request(
            Method::POST,
            "/api/menu",
            Some(&cookie),
            &json!({ "category": "mains", "name": "Free lunch", "price_cents": -1 }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");

    let (status, _) = harness
        .send(json_request(
            Method::POST,
            "/api/menu",
            Some(&cookie),
            &json!({ "category": "mains", "price_cents": 100 }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = harness.send(get("/api/menu/99")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = harness
        .send(bare(Method::DELETE, "/api/menu/99", Some(&cookie)))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = harness
        .send(json_request(
            Method::PUT,
            "/api/menu/99",
            Some(&cookie),
            &json!({ "category": "mains", "name": "Ghost", "price_cents": 100 }),
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn menu_reorder_and_update() {
    let harness = Harness::new();
    let cookie = harness.login().await;

    let first = create_dish(&harness, &cookie, "desserts", "Baklava").await;
    let second = create_dish(&harness, &cookie, "desserts", "Kunefe").await;
    let (first, second) = (
        first["id"].as_i64().expect("id"),
        second["id"].as_i64().expect("id"),
    );

    let (status, body) = harness
        .send(json_request(
            Method::PUT,
            "/api/menu/reorder",
            Some(&cookie),
            &json!({ "items": [second, first] }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), [second, first]);

    let (status, body) = harness
        .send(json_request(
            Method::PUT,
            &format!("/api/menu/{first}"),
            Some(&cookie),
            &json!({
                "category": "desserts",
                "name": "Baklava",
                "price_cents": 900,
                "available": false
            }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["price_cents"], 900);
    assert_eq!(body["available"], false);
}
