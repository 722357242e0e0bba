use crate::commands::cat_file::git_cat_file;
use crate::commands::commit::git_write_commit;
use crate::commands::ls_tree::git_ls_tree;
use crate::commands::resolve_object;
use crate::commands::write_tree::git_write_tree;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use loose_objects::log::render_graphviz;
use loose_objects::{ObjectKind, ObjectPaths, Repository, hash_file};
use std::io::{Write, stdout};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "lgit", about = "Loose object database in the Git format")]
pub struct Args {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[clap(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create an empty repository.
    Init {
        #[clap(default_value = ".")]
        path: PathBuf,
    },
    /// Print the payload of an object.
    CatFile {
        kind: ObjectKind,
        object: String,
    },
    /// Compute an object id, optionally storing the object.
    HashObject {
        #[clap(short = 't', default_value = "blob")]
        kind: ObjectKind,
        #[clap(short = 'w')]
        write: bool,
        file: PathBuf,
    },
    LsTree {
        #[clap(long)]
        name_only: bool,
        tree: String,
    },
    /// Store the worktree as tree objects.
    WriteTree,
    CommitTree {
        #[clap(short = 'm')]
        message: String,
        #[clap(short = 'p')]
        parents: Vec<String>,
        tree: String,
    },
    /// Snapshot the worktree and commit it on the current branch.
    Commit {
        #[clap(short = 'm')]
        message: String,
    },
    /// Print the commit graph as Graphviz.
    Log {
        #[clap(default_value = "HEAD")]
        commit: String,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Command::Init { path } => {
            let repo = Repository::create(&path)
                .with_context(|| format!("failed to create repository at {}", path.display()))?;
            println!(
                "Initialized empty repository in {}",
                repo.gitdir().display()
            );
        }
        Command::CatFile { kind, object } => {
            let repo = find_repository()?;
            git_cat_file(&repo, kind, &object)?;
        }
        Command::HashObject { kind, write, file } => {
            let repo = if write { Some(find_repository()?) } else { None };
            let store = repo.as_ref().map(|r| r as &dyn ObjectPaths);
            let id = hash_file(&file, kind, store)
                .with_context(|| format!("failed to hash {}", file.display()))?;
            println!("{id}");
        }
        Command::LsTree { name_only, tree } => {
            let repo = find_repository()?;
            git_ls_tree(&repo, name_only, &tree)?;
        }
        Command::WriteTree => {
            let repo = find_repository()?;
            let id = git_write_tree(&repo)?;
            println!("{id}");
        }
        Command::CommitTree {
            message,
            parents,
            tree,
        } => {
            let repo = find_repository()?;
            let tree = resolve_object(&repo, &tree)?;
            let parents = parents
                .iter()
                .map(|p| resolve_object(&repo, p))
                .collect::<Result<Vec<_>>>()?;
            let id = git_write_commit(&repo, tree, &parents, &message)?;
            println!("{id}");
        }
        Command::Commit { message } => {
            let repo = find_repository()?;
            let tree = git_write_tree(&repo)?;
            let parents: Vec<_> = repo
                .resolve("HEAD")
                .context("failed to read HEAD")?
                .into_iter()
                .collect();
            let id = git_write_commit(&repo, tree, &parents, &message)?;
            repo.update_head(&id).context("failed to update HEAD")?;
            println!("{id}");
        }
        Command::Log { commit } => {
            let repo = find_repository()?;
            let start = resolve_object(&repo, &commit)?;
            let mut sout = stdout().lock();
            render_graphviz(&repo, start, &mut sout)?;
            sout.flush().context("write to stdout failed")?;
        }
    }
    Ok(())
}

fn find_repository() -> Result<Repository> {
    Repository::find(".").context("not inside a repository")
}
