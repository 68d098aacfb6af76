use std::path::Path;

use reqwest::Method;
use reqwest::multipart::{Form, Part};
use serde_json::{Map, Value, json};
use tavola_api_types::{PageResponse, UploadResponse};

use crate::args::PagesCmd;
use crate::client::{CliError, Ctx};
use crate::io::{parse_pair, read_file_bytes, read_fragment};
use crate::print::print_json;

pub async fn handle(ctx: &Ctx, cmd: PagesCmd) -> Result<(), CliError> {
    match cmd {
        PagesCmd::Get { key } => get(ctx, &key).await,
        PagesCmd::Put { key, input } => put(ctx, &key, read_fragment(input)?).await,
        PagesCmd::Upload {
            key,
            input,
            files,
            bindings,
        } => upload(ctx, &key, read_fragment(input)?, &files, &bindings).await,
    }
}

async fn get(ctx: &Ctx, key: &str) -> Result<(), CliError> {
    let page: PageResponse = ctx.get_json(&format!("api/pages/{key}"), None).await?;
    print_json(&page)
}

async fn put(ctx: &Ctx, key: &str, content: Map<String, Value>) -> Result<(), CliError> {
    let page: PageResponse = ctx
        .send_json(
            Method::PUT,
            &format!("api/pages/{key}"),
            &json!({ "content": content }),
        )
        .await?;
    print_json(&page)
}

async fn upload(
    ctx: &Ctx,
    key: &str,
    content: Map<String, Value>,
    files: &[String],
    bindings: &[String],
) -> Result<(), CliError> {
    let mut form = Form::new().text("content", Value::Object(content).to_string());

    if !bindings.is_empty() {
        let mut table = Map::new();
        for raw in bindings {
            let (field, path) = parse_pair(raw)?;
            table.insert(field, Value::String(path));
        }
        form = form.text("bindings", Value::Object(table).to_string());
    }

    for raw in files {
        let (field, path) = parse_pair(raw)?;
        let path = Path::new(&path);
        let data = read_file_bytes(path)?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("upload.bin")
            .to_string();
        form = form.part(field, Part::bytes(data).file_name(file_name));
    }

    let response = ctx
        .request(Method::POST, &format!("api/pages/{key}/upload"))?
        .multipart(form)
        .send()
        .await?;
    let uploaded: UploadResponse = Ctx::handle(response).await?;
    for placed in &uploaded.placed {
        eprintln!("placed {} -> {}", placed.field, placed.url);
    }
    print_json(&uploaded.page)
}
