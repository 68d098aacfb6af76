use tavola_api_types::MenuItemResponse;

use crate::args::MenuCmd;
use crate::client::{CliError, Ctx};
use crate::handlers::collections::{delete_at, move_item, open};
use crate::print::print_json;
use crate::transport::HttpCollection;

pub async fn handle(ctx: &Ctx, cmd: MenuCmd) -> Result<(), CliError> {
    match cmd {
        MenuCmd::List { category } => {
            let query: Vec<(&str, String)> =
                category.into_iter().map(|value| ("category", value)).collect();
            let items: Vec<MenuItemResponse> = ctx.get_json("api/menu", Some(&query)).await?;
            print_json(&items)
        }
        MenuCmd::Move {
            id,
            target,
            category,
        } => {
            let sync = HttpCollection::menu(ctx.clone(), category);
            let mut editor = open(&sync).await?;
            move_item(&mut editor, &sync, &id, &target).await
        }
        MenuCmd::Delete { id } => {
            let sync = HttpCollection::menu(ctx.clone(), None);
            let mut editor = open(&sync).await?;
            let index = editor
                .items()
                .iter()
                .position(|candidate| *candidate == id)
                .ok_or_else(|| CliError::InvalidInput(format!("menu item {id} does not exist")))?;
            delete_at(&mut editor, &sync, index).await
        }
    }
}
