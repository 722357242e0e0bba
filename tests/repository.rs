use loose_objects::log::render_graphviz;
use loose_objects::{
    Blob, Commit, Kvlm, Object, ObjectId, Repository, RepositoryError, read_object,
    write_object,
};
use std::fs;
use tempfile::TempDir;

fn commit(repo: &Repository, parents: &[ObjectId], message: &str) -> ObjectId {
    let mut kvlm = Kvlm::new();
    kvlm.insert("tree", "4b825dc642cb6eb9a060e54bf8d69288fbee4904")
        .unwrap();
    for parent in parents {
        kvlm.insert("parent", parent.to_string()).unwrap();
    }
    kvlm.insert("author", "A U Thor <author@example.com> 0 +0000")
        .unwrap();
    kvlm.set_message(message);
    write_object(&Object::from(Commit::new(kvlm)), Some(repo)).unwrap()
}

#[test]
fn create_lays_out_metadata() {
    let dir = TempDir::new().unwrap();
    let repo = Repository::create(dir.path().join("work")).unwrap();
    let gitdir = repo.gitdir();
    for sub in ["branches", "objects", "refs/tags", "refs/heads"] {
        assert!(gitdir.join(sub).is_dir(), "{sub}");
    }
    assert_eq!(
        fs::read_to_string(gitdir.join("HEAD")).unwrap(),
        "ref: refs/heads/master\n"
    );
    assert_eq!(
        repo.config("core", "repositoryformatversion")
            .unwrap()
            .as_deref(),
        Some("0")
    );
    assert_eq!(repo.resolve("HEAD").unwrap(), None);
}

#[test]
fn create_refuses_populated_gitdir_and_files() {
    let dir = TempDir::new().unwrap();
    Repository::create(dir.path()).unwrap();
    assert!(matches!(
        Repository::create(dir.path()),
        Err(RepositoryError::NotEmpty(_))
    ));

    let file = dir.path().join("plain");
    fs::write(&file, "x").unwrap();
    assert!(matches!(
        Repository::create(&file),
        Err(RepositoryError::NotADirectory(_))
    ));
}

#[test]
fn find_walks_up_from_subdirectory() {
    let dir = TempDir::new().unwrap();
    let created = Repository::create(dir.path()).unwrap();
    let nested = dir.path().join("a").join("b");
    fs::create_dir_all(&nested).unwrap();

    let found = Repository::find(&nested).unwrap();
    assert_eq!(
        fs::canonicalize(found.gitdir()).unwrap(),
        fs::canonicalize(created.gitdir()).unwrap()
    );
}

#[test]
fn open_checks_format_version() {
    let dir = TempDir::new().unwrap();
    let repo = Repository::create(dir.path()).unwrap();
    fs::write(
        repo.gitdir().join("config"),
        "[core]\n\trepositoryformatversion = 1\n",
    )
    .unwrap();
    assert!(matches!(
        Repository::open(dir.path()),
        Err(RepositoryError::UnsupportedVersion(v)) if v == "1"
    ));

    fs::remove_file(repo.gitdir().join("config")).unwrap();
    assert!(matches!(
        Repository::open(dir.path()),
        Err(RepositoryError::MissingConfig(_))
    ));

    let empty = TempDir::new().unwrap();
    assert!(matches!(
        Repository::open(empty.path()),
        Err(RepositoryError::NotARepository(_))
    ));
}

#[test]
fn objects_live_under_gitdir() {
    let dir = TempDir::new().unwrap();
    let repo = Repository::create(dir.path()).unwrap();
    let blob = Object::from(Blob::new(b"hello world\n".to_vec()));
    let id = write_object(&blob, Some(&repo)).unwrap();
    assert!(
        repo.gitdir()
            .join("objects/3b/18e512dba79e4c8300dd08aeb37f8e728b8dad")
            .is_file()
    );
    assert_eq!(read_object(&repo.objects(), &id).unwrap(), Some(blob));
}

#[test]
fn update_head_moves_the_branch() {
    let dir = TempDir::new().unwrap();
    let repo = Repository::create(dir.path()).unwrap();
    let first = commit(&repo, &[], "first\n");
    repo.update_head(&first).unwrap();
    assert_eq!(repo.resolve("HEAD").unwrap(), Some(first));
    assert_eq!(repo.resolve("refs/heads/master").unwrap(), Some(first));
    assert_eq!(
        repo.resolve(&first.to_string()).unwrap(),
        Some(first)
    );
    assert!(matches!(
        repo.resolve("master"),
        Err(RepositoryError::BadRef(_))
    ));
}

#[test]
fn log_renders_merge_history() {
    let dir = TempDir::new().unwrap();
    let repo = Repository::create(dir.path()).unwrap();
    let root = commit(&repo, &[], "root\n");
    let left = commit(&repo, &[root], "left \"quoted\"\nbody\n");
    let right = commit(&repo, &[root], "right\n");
    let merge = commit(&repo, &[left, right], "merge\n");

    let mut out = Vec::new();
    render_graphviz(&repo, merge, &mut out).unwrap();
    let out = String::from_utf8(out).unwrap();

    assert!(out.starts_with("digraph log{\n"));
    assert!(out.ends_with("}\n"));
    let short = &left.to_hex()[..7];
    assert!(out.contains(&format!("c_{left} [label=\"{short}: left \\\"quoted\\\"\"]")));
    assert!(out.contains(&format!("c_{merge} -> c_{left};")));
    assert!(out.contains(&format!("c_{merge} -> c_{right};")));
    assert_eq!(out.matches(&format!("c_{root} [label")).count(), 1);
}

#[test]
fn log_stops_at_missing_parent() {
    let dir = TempDir::new().unwrap();
    let repo = Repository::create(dir.path()).unwrap();
    let missing = ObjectId::from_bytes([0x77; 20]);
    let tip = commit(&repo, &[missing], "shallow\n");

    let mut out = Vec::new();
    render_graphviz(&repo, tip, &mut out).unwrap();
    let out = String::from_utf8(out).unwrap();
    assert!(out.contains(&format!("c_{tip} -> c_{missing};")));
    assert!(!out.contains(&format!("c_{missing} [label")));
}
