use httpmock::MockServer;
use serde_json::{Value, json};
use tempfile::NamedTempFile;

use crate::args::{Cli, Commands, ContentInput, PagesCmd, PostsArgs, PostsCmd};
use crate::client::{CliError, Ctx, build_ctx_from_cli};
use crate::editor::{CollectionEditor, SyncOutcome, delete_and_sync, drag_and_sync};
use crate::handlers::pages;
use crate::transport::HttpCollection;

const STAMP: &str = "2026-10-19T12:00:00Z";

fn ctx(server: &MockServer) -> Ctx {
    Ctx::new(&server.base_url(), "pw".into()).expect("ctx")
}

fn tmp_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("tmp file");
    std::io::Write::write_all(&mut file, contents.as_bytes()).expect("write tmp");
    file
}

fn cli(password_file: Option<std::path::PathBuf>, password_env: Option<&str>) -> Cli {
    Cli {
        site: Some("https://example.com".to_string()),
        password_file,
        password_env: password_env.map(String::from),
        command: Commands::Posts(PostsArgs {
            action: PostsCmd::List,
        }),
    }
}

fn homepage(logos: &[&str]) -> Value {
    json!({
        "page_key": "homepage",
        "content": { "customers": { "title": "Friends", "logos": logos } },
        "updated_at": STAMP
    })
}

fn post(id: i64, position: i32) -> Value {
    json!({
        "id": id,
        "slug": format!("post-{id}"),
        "title": format!("Post {id}"),
        "excerpt": "",
        "body": "",
        "image": null,
        "position": position,
        "published": true,
        "created_at": STAMP,
        "updated_at": STAMP
    })
}

fn dish(id: i64, position: i32) -> Value {
    json!({
        "id": id,
        "category": "mains",
        "name": format!("Dish {id}"),
        "description": "",
        "price_cents": 1200,
        "available": true,
        "position": position,
        "created_at": STAMP,
        "updated_at": STAMP
    })
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| (*item).to_string()).collect()
}

#[test]
fn build_ctx_prefers_password_file() -> Result<(), CliError> {
    let file = tmp_file("from-file\n");
    let ctx = build_ctx_from_cli(&cli(Some(file.path().to_path_buf()), Some("from-env")))?;
    assert!(!ctx.is_logged_in());
    assert_eq!(ctx.base.as_str(), "https://example.com/");
    Ok(())
}

#[test]
fn build_ctx_errors_without_password() {
    let err = build_ctx_from_cli(&cli(None, None)).expect_err("missing password should fail");
    assert!(matches!(err, CliError::MissingPassword));
}

#[test]
fn pairs_and_fragments_are_validated() {
    assert_eq!(
        crate::io::parse_pair("featureImage_halal=./halal.jpg").expect("pair"),
        ("featureImage_halal".to_string(), "./halal.jpg".to_string())
    );
    assert!(crate::io::parse_pair("logo").is_err());
    assert!(crate::io::parse_pair("=x.png").is_err());

    let empty = crate::io::read_fragment(ContentInput::default()).expect("default fragment");
    assert!(empty.is_empty());

    let err = crate::io::read_fragment(ContentInput {
        content: Some("[1, 2]".into()),
        content_file: None,
    })
    .expect_err("arrays are not fragments");
    assert!(matches!(err, CliError::InvalidInput(_)));
}

#[tokio::test]
async fn login_cookie_rides_along_on_later_requests() -> Result<(), CliError> {
    let server = MockServer::start();
    let login = server.mock(|when, then| {
        when.method("POST")
            .path("/api/auth/login")
            .json_body(json!({ "password": "pw" }));
        then.status(200)
            .header("content-type", "application/json")
            .header("set-cookie", "tavola_session=tok123; HttpOnly; SameSite=Lax; Path=/")
            .json_body(json!({ "expires_at": STAMP }));
    });
    let page = server.mock(|when, then| {
        when.method("GET")
            .path("/api/pages/footer")
            .header("cookie", "tavola_session=tok123");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({ "page_key": "footer", "content": {}, "updated_at": null }));
    });

    let mut ctx = ctx(&server);
    ctx.login().await?;
    assert!(ctx.is_logged_in());
    pages::handle(
        &ctx,
        PagesCmd::Get {
            key: "footer".into(),
        },
    )
    .await?;

    login.assert();
    page.assert();
    Ok(())
}

#[tokio::test]
async fn refused_login_is_reported() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("POST").path("/api/auth/login");
        then.status(401)
            .header("content-type", "application/json")
            .json_body(json!({ "error": { "code": "unauthorized", "message": "Authentication required" } }));
    });

    let mut ctx = ctx(&server);
    let err = ctx.login().await.expect_err("login should fail");
    assert!(matches!(err, CliError::Login(_)));
    assert!(!ctx.is_logged_in());
}

#[tokio::test]
async fn page_image_drag_submits_and_refetches() -> Result<(), CliError> {
    let server = MockServer::start();
    let reorder = server.mock(|when, then| {
        when.method("PUT")
            .path("/api/pages/homepage/collections/customers/reorder")
            .json_body(json!({ "logos": ["/c.png", "/a.png", "/b.png"] }));
        then.status(200)
            .header("content-type", "application/json")
            .json_body(homepage(&["/c.png", "/a.png", "/b.png"]));
    });
    let refetch = server.mock(|when, then| {
        when.method("GET").path("/api/pages/homepage");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(homepage(&["/c.png", "/a.png", "/b.png"]));
    });

    let sync = HttpCollection::page_images(ctx(&server), "homepage", "customers")?;
    let mut editor = CollectionEditor::new(strings(&["/a.png", "/b.png", "/c.png"]));
    let outcome = drag_and_sync(&mut editor, &sync, &"/c.png".to_string(), &"/a.png".to_string())
        .await
        .expect("editor");

    assert_eq!(outcome, SyncOutcome::Confirmed);
    assert_eq!(editor.items(), ["/c.png", "/a.png", "/b.png"]);
    reorder.assert();
    refetch.assert();
    Ok(())
}

#[tokio::test]
async fn rejected_reorder_rolls_back_to_the_stored_order() -> Result<(), CliError> {
    let server = MockServer::start();
    let reorder = server.mock(|when, then| {
        when.method("PUT")
            .path("/api/pages/homepage/collections/customers/reorder");
        then.status(503)
            .header("content-type", "application/json")
            .json_body(json!({ "error": { "code": "store_unavailable", "message": "Content store unavailable" } }));
    });

    let sync = HttpCollection::page_images(ctx(&server), "homepage", "customers")?;
    let mut editor = CollectionEditor::new(strings(&["/a.png", "/b.png", "/c.png"]));
    let outcome = drag_and_sync(&mut editor, &sync, &"/c.png".to_string(), &"/a.png".to_string())
        .await
        .expect("editor");

    assert_eq!(outcome, SyncOutcome::RolledBack);
    assert_eq!(editor.items(), ["/a.png", "/b.png", "/c.png"]);
    let notices = editor.take_notices();
    assert_eq!(notices.len(), 1);
    assert!(notices[0].to_string().contains("store_unavailable"));
    reorder.assert();
    Ok(())
}

#[tokio::test]
async fn page_image_delete_uses_the_index() -> Result<(), CliError> {
    let server = MockServer::start();
    let delete = server.mock(|when, then| {
        when.method("DELETE")
            .path("/api/pages/homepage/collections/customers/1");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(homepage(&["/a.png", "/c.png"]));
    });
    let refetch = server.mock(|when, then| {
        when.method("GET").path("/api/pages/homepage");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(homepage(&["/a.png", "/c.png"]));
    });

    let sync = HttpCollection::page_images(ctx(&server), "homepage", "customers")?;
    let mut editor = CollectionEditor::new(strings(&["/a.png", "/b.png", "/c.png"]));
    let outcome = delete_and_sync(&mut editor, &sync, 1)
        .await
        .expect("editor");

    assert_eq!(outcome, SyncOutcome::Confirmed);
    assert_eq!(editor.items(), ["/a.png", "/c.png"]);
    delete.assert();
    refetch.assert();
    Ok(())
}

#[tokio::test]
async fn post_moves_send_the_full_order() -> Result<(), CliError> {
    let server = MockServer::start();
    let reorder = server.mock(|when, then| {
        when.method("PUT")
            .path("/api/posts/reorder")
            .json_body(json!({ "posts": [3, 1, 2] }));
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!([post(3, 0), post(1, 1), post(2, 2)]));
    });
    let refetch = server.mock(|when, then| {
        when.method("GET").path("/api/posts");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!([post(3, 0), post(1, 1), post(2, 2)]));
    });

    let sync = HttpCollection::posts(ctx(&server));
    let mut editor = CollectionEditor::new(vec![1, 2, 3]);
    let outcome = drag_and_sync(&mut editor, &sync, &3, &1)
        .await
        .expect("editor");

    assert_eq!(outcome, SyncOutcome::Confirmed);
    assert_eq!(editor.items(), [3, 1, 2]);
    reorder.assert();
    refetch.assert();
    Ok(())
}

#[tokio::test]
async fn menu_delete_refetches_the_category() {
    let server = MockServer::start();
    let list = server.mock(|when, then| {
        when.method("GET")
            .path("/api/menu")
            .query_param("category", "mains");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!([dish(4, 0), dish(9, 1)]));
    });
    let delete = server.mock(|when, then| {
        when.method("DELETE").path("/api/menu/7");
        then.status(204);
    });

    let sync = HttpCollection::menu(ctx(&server), Some("mains".into()));
    let mut editor = CollectionEditor::new(vec![4, 7, 9]);
    let outcome = delete_and_sync(&mut editor, &sync, 1)
        .await
        .expect("editor");

    assert_eq!(outcome, SyncOutcome::Confirmed);
    assert_eq!(editor.items(), [4, 9]);
    delete.assert();
    list.assert();
}

#[tokio::test]
async fn unknown_collections_fail_before_any_request() {
    let server = MockServer::start();
    let err = HttpCollection::page_images(ctx(&server), "homepage", "gallery")
        .expect_err("unknown collection");
    assert!(matches!(err, CliError::InvalidInput(_)));
}
