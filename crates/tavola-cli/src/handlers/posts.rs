use tavola_api_types::PostResponse;

use crate::args::PostsCmd;
use crate::client::{CliError, Ctx};
use crate::handlers::collections::{delete_at, move_item, open};
use crate::print::print_json;
use crate::transport::HttpCollection;

pub async fn handle(ctx: &Ctx, cmd: PostsCmd) -> Result<(), CliError> {
    match cmd {
        PostsCmd::List => {
            let posts: Vec<PostResponse> = ctx.get_json("api/posts", None).await?;
            print_json(&posts)
        }
        PostsCmd::Move { id, target } => {
            let sync = HttpCollection::posts(ctx.clone());
            let mut editor = open(&sync).await?;
            move_item(&mut editor, &sync, &id, &target).await
        }
        PostsCmd::Delete { id } => {
            let sync = HttpCollection::posts(ctx.clone());
            let mut editor = open(&sync).await?;
            let index = editor
                .items()
                .iter()
                .position(|candidate| *candidate == id)
                .ok_or_else(|| CliError::InvalidInput(format!("post {id} does not exist")))?;
            delete_at(&mut editor, &sync, index).await
        }
    }
}
