use std::fs;
use std::path::{Path, PathBuf};

fn collect_rs_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        if let Ok(read_dir) = fs::read_dir(&dir) {
            for entry in read_dir.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    stack.push(path);
                } else if path.extension().map(|e| e == "rs").unwrap_or(false) {
                    files.push(path);
                }
            }
        }
    }
    files
}

fn file_contains(path: &Path, needle: &str) -> bool {
    fs::read_to_string(path)
        .map(|c| c.contains(needle))
        .unwrap_or(false)
}

#[test]
fn match_writes_only_go_through_the_ledger() {
    let src = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("src");

    let allowed = [
        // the ledger is the only writer
        "src/services/ledger.rs",
        // store implementations and their own tests
        "src/repository/trait.rs",
        "src/repository/memory.rs",
        "src/repository/postgres_repository.rs",
    ];

    let mut offenders = Vec::new();
    for file in collect_rs_files(&src) {
        let path_str = file.to_string_lossy().replace('\\', "/");
        if allowed.iter().any(|a| path_str.ends_with(a)) {
            continue;
        }
        if file_contains(&file, ".create_pair(")
            || file_contains(&file, ".update_pair(")
            || file_contains(&file, "INSERT INTO matches")
            || file_contains(&file, "UPDATE matches")
        {
            offenders.push(path_str);
        }
    }

    if !offenders.is_empty() {
        panic!(
            "Match records must be written through MatchLedger only. Offenders: {:?}",
            offenders
        );
    }
}

#[test]
fn pair_order_is_normalized_in_one_place() {
    let src = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("src");

    let mut offenders = Vec::new();
    for file in collect_rs_files(&src) {
        let path_str = file.to_string_lossy().replace('\\', "/");
        if path_str.ends_with("src/domain/pair.rs") {
            continue;
        }
        if file_contains(&file, "CanonicalPair {") {
            offenders.push(path_str);
        }
    }

    assert!(
        offenders.is_empty(),
        "CanonicalPair must only be built by canonical_pair(). Offenders: {:?}",
        offenders
    );
}
