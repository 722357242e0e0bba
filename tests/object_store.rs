use flate2::Compression;
use flate2::write::ZlibEncoder;
use loose_objects::{
    Blob, Commit, Kvlm, Object, ObjectDir, ObjectError, ObjectId, ObjectKind, ObjectPaths, Tree,
    TreeEntry, read_object, read_object_of_kind, write_object,
};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;

fn store_files(root: &Path) -> Vec<String> {
    let mut files = Vec::new();
    for shard in fs::read_dir(root).unwrap() {
        let shard = shard.unwrap();
        for file in fs::read_dir(shard.path()).unwrap() {
            let file = file.unwrap();
            files.push(format!(
                "{}/{}",
                shard.file_name().to_string_lossy(),
                file.file_name().to_string_lossy()
            ));
        }
    }
    files.sort();
    files
}

fn write_raw(store: &ObjectDir, id: &ObjectId, framed: &[u8]) {
    let (dir, file) = id.shard();
    let path = store
        .resolve(&Path::new(&dir).join(file), true)
        .unwrap();
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(framed).unwrap();
    fs::write(path, encoder.finish().unwrap()).unwrap();
}

#[test]
fn write_then_read_blob() {
    let dir = TempDir::new().unwrap();
    let store = ObjectDir::new(dir.path());
    let blob = Object::from(Blob::new(b"what is up, doc?".to_vec()));

    let id = write_object(&blob, Some(&store)).unwrap();
    assert_eq!(id.to_string(), "bd9dbf5aae1a3862dd1526723246b20206e5fc37");
    assert_eq!(
        store_files(dir.path()),
        ["bd/9dbf5aae1a3862dd1526723246b20206e5fc37"]
    );
    assert_eq!(read_object(&store, &id).unwrap(), Some(blob));
}

#[test]
fn stored_bytes_are_zlib_framed() {
    let dir = TempDir::new().unwrap();
    let store = ObjectDir::new(dir.path());
    let id = write_object(&Object::from(Blob::new(b"abc".to_vec())), Some(&store)).unwrap();
    let (shard, file) = id.shard();
    let compressed = fs::read(dir.path().join(shard).join(file)).unwrap();
    let mut decoder = flate2::read::ZlibDecoder::new(compressed.as_slice());
    let mut framed = Vec::new();
    std::io::Read::read_to_end(&mut decoder, &mut framed).unwrap();
    assert_eq!(framed, b"blob 3\0abc");
}

#[test]
fn writing_twice_leaves_one_file() {
    let dir = TempDir::new().unwrap();
    let store = ObjectDir::new(dir.path());
    let blob = Object::from(Blob::new(b"twice".to_vec()));

    let first = write_object(&blob, Some(&store)).unwrap();
    let (shard, file) = first.shard();
    let path = dir.path().join(&shard).join(&file);
    let before = fs::metadata(&path).unwrap().modified().unwrap();

    let second = write_object(&blob, Some(&store)).unwrap();
    assert_eq!(first, second);
    assert_eq!(store_files(dir.path()), [format!("{shard}/{file}")]);
    assert_eq!(fs::metadata(&path).unwrap().modified().unwrap(), before);
}

#[test]
fn dry_run_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let blob = Object::from(Blob::new(b"dry".to_vec()));
    let id = write_object(&blob, None).unwrap();
    assert!(store_files(dir.path()).is_empty());
    let store = ObjectDir::new(dir.path());
    assert_eq!(write_object(&blob, Some(&store)).unwrap(), id);
}

#[test]
fn missing_object_is_none() {
    let dir = TempDir::new().unwrap();
    let store = ObjectDir::new(dir.path());
    let id = ObjectId::from_bytes([0x42; 20]);
    assert!(read_object(&store, &id).unwrap().is_none());
    assert!(!dir.path().join("42").exists());
}

#[test]
fn commit_and_tree_round_trip_through_store() {
    let dir = TempDir::new().unwrap();
    let store = ObjectDir::new(dir.path());

    let blob_id = write_object(&Object::from(Blob::new(b"x\n".to_vec())), Some(&store)).unwrap();
    let mut tree = Tree::new();
    tree.insert(TreeEntry::new("100644", "x.txt", blob_id).unwrap());
    let tree_id = write_object(&Object::from(tree.clone()), Some(&store)).unwrap();

    let mut kvlm = Kvlm::new();
    kvlm.insert("tree", tree_id.to_string()).unwrap();
    kvlm.insert("author", "A <a@example.com> 0 +0000").unwrap();
    kvlm.set_message("first\n");
    let commit = Object::from(Commit::new(kvlm));
    let commit_id = write_object(&commit, Some(&store)).unwrap();

    let read_back = read_object(&store, &commit_id).unwrap().unwrap();
    assert_eq!(read_back, commit);
    let Object::Commit(read_commit) = read_back else {
        panic!("expected a commit");
    };
    assert_eq!(read_commit.tree().unwrap(), tree_id);
    assert_eq!(
        read_object(&store, &tree_id).unwrap().unwrap(),
        Object::Tree(tree)
    );
}

#[test]
fn declared_length_mismatch_names_the_object() {
    let dir = TempDir::new().unwrap();
    let store = ObjectDir::new(dir.path());
    let id = ObjectId::from_bytes([0x01; 20]);
    write_raw(&store, &id, b"blob 10\0short");

    let err = read_object(&store, &id).unwrap_err();
    match &err {
        ObjectError::Corrupt { id: bad, source } => {
            assert_eq!(*bad, id);
            assert!(matches!(**source, ObjectError::Framing { offset: 8, .. }));
        }
        other => panic!("unexpected error {other}"),
    }
    assert!(err.to_string().contains(&id.to_string()));
}

#[test]
fn unknown_type_is_fatal() {
    let dir = TempDir::new().unwrap();
    let store = ObjectDir::new(dir.path());
    let id = ObjectId::from_bytes([0x02; 20]);
    write_raw(&store, &id, b"note 2\0hi");

    let err = read_object(&store, &id).unwrap_err();
    assert!(matches!(
        err,
        ObjectError::Corrupt { ref source, .. } if matches!(**source, ObjectError::UnknownType(_))
    ));
}

#[test]
fn garbage_file_is_corrupt() {
    let dir = TempDir::new().unwrap();
    let store = ObjectDir::new(dir.path());
    let id = ObjectId::from_bytes([0x03; 20]);
    let path = store.resolve(&Path::new("03").join(&id.shard().1), true).unwrap();
    fs::write(path, b"not zlib at all").unwrap();
    assert!(matches!(
        read_object(&store, &id),
        Err(ObjectError::Corrupt { .. })
    ));
}

#[test]
fn truncated_tree_entry_is_a_parse_error() {
    let dir = TempDir::new().unwrap();
    let store = ObjectDir::new(dir.path());
    let id = ObjectId::from_bytes([0x04; 20]);
    let mut payload = b"100644 a\0".to_vec();
    payload.extend_from_slice(&[0xee; 12]);
    let mut framed = format!("tree {}\0", payload.len()).into_bytes();
    framed.extend_from_slice(&payload);
    write_raw(&store, &id, &framed);

    let err = read_object(&store, &id).unwrap_err();
    assert!(matches!(
        err,
        ObjectError::Corrupt { ref source, .. } if matches!(**source, ObjectError::Parse { offset: 9, .. })
    ));
}

#[test]
fn kind_check_on_read() {
    let dir = TempDir::new().unwrap();
    let store = ObjectDir::new(dir.path());
    let id = write_object(&Object::from(Blob::new(b"b".to_vec())), Some(&store)).unwrap();
    assert!(matches!(
        read_object_of_kind(&store, &id, ObjectKind::Tree),
        Err(ObjectError::UnexpectedKind {
            expected: ObjectKind::Tree,
            found: ObjectKind::Blob,
            ..
        })
    ));
    assert!(
        read_object_of_kind(&store, &id, ObjectKind::Blob)
            .unwrap()
            .is_some()
    );
}
