use anyhow::{Context, Result, bail};
use chrono::{DateTime, FixedOffset, Local};
use loose_objects::repository::config_value;
use loose_objects::{Commit, Kvlm, Object, ObjectId, Repository, write_object};
use std::env;

/// Author and committer of new commits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

/// Write a commit of `tree` on top of `parents` and return its id.
///
/// Steps:
/// 1. Build the header lines (`tree`, one `parent` per parent, `author`, `committer`).
/// 2. Append a blank line and the message.
/// 3. Hash, compress and store it like any other object.
pub fn git_write_commit(
    repo: &Repository,
    tree: ObjectId,
    parents: &[ObjectId],
    message: &str,
) -> Result<ObjectId> {
    let identity = get_identity(repo)?;
    let commit = build_commit(tree, parents, &identity, Local::now().fixed_offset(), message)?;
    let id = write_object(&Object::from(commit), Some(repo))?;
    Ok(id)
}

pub fn build_commit(
    tree: ObjectId,
    parents: &[ObjectId],
    identity: &Identity,
    when: DateTime<FixedOffset>,
    message: &str,
) -> Result<Commit> {
    let signature = format!(
        "{} <{}> {} {}",
        identity.name,
        identity.email,
        when.timestamp(),
        format_timezone(when.offset().local_minus_utc())
    );
    let mut kvlm = Kvlm::new();
    kvlm.insert("tree", tree.to_string())?;
    for parent in parents {
        kvlm.insert("parent", parent.to_string())?;
    }
    kvlm.insert("author", signature.as_str())?;
    kvlm.insert("committer", signature)?;
    let mut message = message.to_string();
    if !message.ends_with('\n') {
        message.push('\n');
    }
    kvlm.set_message(message);
    Ok(Commit::new(kvlm))
}

fn format_timezone(offset_seconds: i32) -> String {
    let sign = if offset_seconds < 0 { '-' } else { '+' };
    let offset = offset_seconds.abs();
    format!("{}{:02}{:02}", sign, offset / 3600, offset % 3600 / 60)
}

/// `user.name` and `user.email` from the repository config, then `~/.gitconfig`.
fn get_identity(repo: &Repository) -> Result<Identity> {
    let mut name = repo.config("user", "name")?;
    let mut email = repo.config("user", "email")?;
    if name.is_none() || email.is_none() {
        let mut path = env::home_dir().context("Couldn't determine home directory")?;
        path.push(".gitconfig");
        if name.is_none() {
            name = config_value(&path, "user", "name")
                .with_context(|| format!("Failed to read git config file at {:?}", path))?;
        }
        if email.is_none() {
            email = config_value(&path, "user", "email")
                .with_context(|| format!("Failed to read git config file at {:?}", path))?;
        }
    }
    let (Some(name), Some(email)) = (name, email) else {
        bail!("set user.name and user.email before committing");
    };
    Ok(Identity { name, email })
}
