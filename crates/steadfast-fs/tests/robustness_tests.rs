use assert_fs::prelude::*;
use predicates::prelude::*;
use std::sync::{Arc, Barrier};
use std::thread;
use steadfast_fs::writer::artifact_path;
use steadfast_fs::{Artifact, DurableWriter, File, NormalizedPath};

#[test]
fn remove_twice_with_stray_staged_file() {
    let temp = assert_fs::TempDir::new().unwrap();
    let target = temp.child("page.txt");
    target.write_str("content").unwrap();
    let staged = temp.child(format!("page.txt{}", Artifact::Staged));
    staged.write_str("leftover").unwrap();

    let mut file = File::new(target.path());
    file.remove().unwrap();
    file.remove().unwrap();

    target.assert(predicate::path::missing());
    staged.assert(predicate::path::missing());
}

#[test]
fn remove_twice_without_stray_staged_file() {
    let temp = assert_fs::TempDir::new().unwrap();
    let target = temp.child("page.txt");
    target.write_str("content").unwrap();

    let mut file = File::new(target.path());
    file.remove().unwrap();
    file.remove().unwrap();

    target.assert(predicate::path::missing());
}

#[test]
fn remove_clears_stray_backup() {
    let temp = assert_fs::TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.child("page.txt").path());
    let backup = artifact_path(&path, Artifact::Backup);
    std::fs::write(backup.to_native(), "old").unwrap();

    DurableWriter::default().remove(&path).unwrap();

    assert!(!backup.exists());
}

#[test]
fn remove_of_missing_file_is_ok() {
    let temp = assert_fs::TempDir::new().unwrap();
    let mut file = File::new(temp.child("never-written.txt").path());
    assert!(file.remove().is_ok());
}

#[test]
fn touch_creates_empty_file_once() {
    let temp = assert_fs::TempDir::new().unwrap();
    let child = temp.child("notes/new.txt");
    let mut file = File::new(child.path());

    file.touch().unwrap();
    child.assert("");

    file.write("kept").unwrap();
    file.touch().unwrap();
    child.assert("kept");
}

#[test]
fn cleanup_removes_empty_parents() {
    let temp = assert_fs::TempDir::new().unwrap();
    // Keeps the walk from climbing out of the fixture
    temp.child("anchor.txt").touch().unwrap();
    let child = temp.child("a/b/page.txt");
    child.write_str("content").unwrap();

    let mut file = File::new(child.path());
    assert!(file.cleanup().unwrap());

    temp.child("a").assert(predicate::path::missing());
    temp.child("anchor.txt").assert(predicate::path::exists());
}

#[test]
fn copy_and_rename_keep_content() {
    let temp = assert_fs::TempDir::new().unwrap();
    let source = temp.child("source.txt");
    source.write_str("payload").unwrap();

    let file = File::new(source.path());
    let copy = file.copy_into(&steadfast_fs::Dir::new(temp.child("copies").path())).unwrap();
    temp.child("copies/source.txt").assert("payload");

    let moved = copy.rename_to(temp.child("moved/dest.txt").path()).unwrap();
    temp.child("moved/dest.txt").assert("payload");
    temp.child("copies/source.txt").assert(predicate::path::missing());
    assert!(moved.exists());
}

#[test]
fn concurrent_writes_to_different_files_all_succeed() {
    let temp = assert_fs::TempDir::new().unwrap();
    let num_threads = 5;
    let barrier = Arc::new(Barrier::new(num_threads));

    let handles: Vec<_> = (0..num_threads)
        .map(|thread_id| {
            let dir_path = temp.path().to_path_buf();
            let barrier = Arc::clone(&barrier);

            thread::spawn(move || {
                barrier.wait();
                let mut file = File::with_conflict_check(dir_path.join(format!("file_{thread_id}.txt")));
                for i in 0..10 {
                    file.write(&format!("content_{thread_id}_{i}"))?;
                }
                Ok::<_, steadfast_fs::Error>(())
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread should not panic").unwrap();
    }

    for thread_id in 0..num_threads {
        temp.child(format!("file_{thread_id}.txt"))
            .assert(format!("content_{thread_id}_9"));
    }
}
