//! Command-line surface for `tavola-cli`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "tavola-cli", version, about = "Tavola admin client", long_about = None)]
pub struct Cli {
    /// Site base URL, e.g. <https://example.com>
    #[arg(long, env = "TAVOLA_SITE_URL")]
    pub site: Option<String>,

    /// File holding the admin password (takes precedence over env)
    #[arg(long, env = "TAVOLA_ADMIN_PASSWORD_FILE")]
    pub password_file: Option<PathBuf>,

    /// Admin password from env (no flag, so it stays out of shell history)
    #[arg(hide = true, env = "TAVOLA_ADMIN_PASSWORD")]
    pub password_env: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Page documents
    Pages(PagesArgs),
    /// Image collections inside pages
    Collections(CollectionsArgs),
    /// Blog posts
    Posts(PostsArgs),
    /// Menu items
    Menu(MenuArgs),
}

#[derive(Parser, Debug)]
pub struct PagesArgs {
    #[command(subcommand)]
    pub action: PagesCmd,
}

/// Inline JSON or a file holding it.
#[derive(Args, Debug, Clone, Default)]
pub struct ContentInput {
    #[arg(long)]
    pub content: Option<String>,
    #[arg(long, conflicts_with = "content")]
    pub content_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum PagesCmd {
    /// Show a page document
    Get { key: String },
    /// Merge a JSON fragment into a page
    Put {
        key: String,
        #[command(flatten)]
        input: ContentInput,
    },
    /// Upload files together with a JSON fragment
    Upload {
        key: String,
        #[command(flatten)]
        input: ContentInput,
        /// File part as FIELD=PATH, e.g. `featureImage_halal=./halal.jpg`
        #[arg(long = "file", value_name = "FIELD=PATH", required = true)]
        files: Vec<String>,
        /// Explicit binding as FIELD=CONTENT_PATH, e.g. `portrait=image`
        #[arg(long = "bind", value_name = "FIELD=CONTENT_PATH")]
        bindings: Vec<String>,
    },
}

#[derive(Parser, Debug)]
pub struct CollectionsArgs {
    #[command(subcommand)]
    pub action: CollectionsCmd,
}

#[derive(Subcommand, Debug)]
pub enum CollectionsCmd {
    /// List a collection with positions
    Show { page: String, collection: String },
    /// Move the item at FROM to position TO
    Move {
        page: String,
        collection: String,
        from: usize,
        to: usize,
    },
    /// Remove the item at INDEX
    Delete {
        page: String,
        collection: String,
        index: usize,
    },
}

#[derive(Parser, Debug)]
pub struct PostsArgs {
    #[command(subcommand)]
    pub action: PostsCmd,
}

#[derive(Subcommand, Debug)]
pub enum PostsCmd {
    /// List posts in display order
    List,
    /// Move post ID to where post TARGET sits
    Move { id: i64, target: i64 },
    /// Delete a post
    Delete { id: i64 },
}

#[derive(Parser, Debug)]
pub struct MenuArgs {
    #[command(subcommand)]
    pub action: MenuCmd,
}

#[derive(Subcommand, Debug)]
pub enum MenuCmd {
    /// List menu items, optionally for one category
    List {
        #[arg(long)]
        category: Option<String>,
    },
    /// Move item ID to where item TARGET sits within its category
    Move {
        id: i64,
        target: i64,
        #[arg(long)]
        category: Option<String>,
    },
    /// Delete a menu item
    Delete { id: i64 },
}
