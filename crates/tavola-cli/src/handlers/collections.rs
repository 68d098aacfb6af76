use std::fmt::{Debug, Display};

use crate::args::CollectionsCmd;
use crate::client::{CliError, Ctx};
use crate::editor::{CollectionEditor, SyncOutcome, delete_and_sync, drag_and_sync};
use crate::print::{print_notices, print_positions};
use crate::transport::{CollectionSync, HttpCollection};

pub async fn handle(ctx: &Ctx, cmd: CollectionsCmd) -> Result<(), CliError> {
    match cmd {
        CollectionsCmd::Show { page, collection } => {
            let sync = HttpCollection::page_images(ctx.clone(), &page, &collection)?;
            print_positions(&sync.fetch().await?);
            Ok(())
        }
        CollectionsCmd::Move {
            page,
            collection,
            from,
            to,
        } => {
            let sync = HttpCollection::page_images(ctx.clone(), &page, &collection)?;
            let mut editor = open(&sync).await?;
            let source = item(&editor, from)?;
            let target = item(&editor, to)?;
            move_item(&mut editor, &sync, &source, &target).await
        }
        CollectionsCmd::Delete {
            page,
            collection,
            index,
        } => {
            let sync = HttpCollection::page_images(ctx.clone(), &page, &collection)?;
            let mut editor = open(&sync).await?;
            delete_at(&mut editor, &sync, index).await
        }
    }
}

/// Editor seeded with the collection as currently stored.
pub async fn open<T, S>(sync: &S) -> Result<CollectionEditor<T>, CliError>
where
    T: Clone + PartialEq + Debug + Send + Sync,
    S: CollectionSync<T>,
{
    Ok(CollectionEditor::new(sync.fetch().await?))
}

fn item<T>(editor: &CollectionEditor<T>, index: usize) -> Result<T, CliError>
where
    T: Clone + PartialEq + Debug,
{
    editor
        .item_at(index)
        .cloned()
        .map_err(|err| CliError::InvalidInput(err.to_string()))
}

pub async fn move_item<T, S>(
    editor: &mut CollectionEditor<T>,
    sync: &S,
    source: &T,
    target: &T,
) -> Result<(), CliError>
where
    T: Clone + PartialEq + Debug + Display + Send + Sync,
    S: CollectionSync<T>,
{
    let outcome = drag_and_sync(editor, sync, source, target)
        .await
        .map_err(|err| CliError::InvalidInput(err.to_string()))?;
    report(editor, outcome)
}

pub async fn delete_at<T, S>(
    editor: &mut CollectionEditor<T>,
    sync: &S,
    index: usize,
) -> Result<(), CliError>
where
    T: Clone + PartialEq + Debug + Display + Send + Sync,
    S: CollectionSync<T>,
{
    let outcome = delete_and_sync(editor, sync, index)
        .await
        .map_err(|err| CliError::InvalidInput(err.to_string()))?;
    report(editor, outcome)
}

fn report<T>(editor: &mut CollectionEditor<T>, outcome: SyncOutcome) -> Result<(), CliError>
where
    T: Clone + PartialEq + Debug + Display,
{
    let notices = editor.take_notices();
    print_notices(&notices);
    print_positions(editor.items());
    match outcome {
        SyncOutcome::RolledBack => Err(CliError::Server(
            "the server refused the change; the collection is unchanged".into(),
        )),
        SyncOutcome::Unchanged | SyncOutcome::Confirmed | SyncOutcome::Unverified => Ok(()),
    }
}
