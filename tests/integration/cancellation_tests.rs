use dupsift::duplicates::{
    prefilter, run_pass, ByteSignaturePass, CandidateRecord, CandidateStore, DuplicateFinder,
    FinderConfig, FingerprintPass, PrefilterOptions,
};
use dupsift::error::ExitCode;
use dupsift::progress::ProgressCallback;
use dupsift::signal::CancellationToken;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

/// Requests a stop when a given phase starts and records the phases seen.
struct StopAtPhase {
    phase: &'static str,
    token: CancellationToken,
    seen: Mutex<Vec<String>>,
}

impl StopAtPhase {
    fn new(phase: &'static str, token: CancellationToken) -> Self {
        Self {
            phase,
            token,
            seen: Mutex::new(Vec::new()),
        }
    }
}

impl ProgressCallback for StopAtPhase {
    fn on_phase_start(&self, phase: &str, _total: usize) {
        self.seen.lock().unwrap().push(phase.to_string());
        if phase == self.phase {
            self.token.request();
        }
    }

    fn on_progress(&self, _current: usize, _path: &str) {}

    fn on_phase_end(&self, _phase: &str) {}
}

fn populate(root: &Path) {
    fs::write(root.join("dup1"), vec![b'd'; 300]).unwrap();
    fs::write(root.join("dup2"), vec![b'd'; 300]).unwrap();

    // Same size and edges as each other, different head slices
    let mut near1 = vec![b'n'; 500];
    let mut near2 = vec![b'n'; 500];
    near1[10] = 1;
    near2[10] = 2;
    fs::write(root.join("near1"), near1).unwrap();
    fs::write(root.join("near2"), near2).unwrap();
}

fn finder_stopping_at(phase: &'static str) -> (DuplicateFinder, Arc<StopAtPhase>) {
    let token = CancellationToken::new();
    let callback = Arc::new(StopAtPhase::new(phase, token.clone()));
    let config = FinderConfig::default()
        .with_cancellation(token)
        .with_progress_callback(callback.clone());
    (DuplicateFinder::new(config), callback)
}

#[test]
fn test_stop_during_fingerprint_still_hashes() {
    let dir = tempdir().unwrap();
    populate(dir.path());

    let (finder, callback) = finder_stopping_at("fingerprint");
    let (groups, summary) = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();

    // The fingerprint pass was cut short, so the near pair reached the
    // checksum stage, where the differing digests kept it out of the results
    assert!(summary.interrupted);
    assert_eq!(summary.eliminated_by_fingerprint, 0);
    assert_eq!(summary.hashed_files, 4);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].size, 300);

    let seen = callback.seen.lock().unwrap();
    assert_eq!(
        *seen,
        vec!["walking", "bytecompare", "fingerprint", "checksum"]
    );
}

#[test]
fn test_stop_during_checksum_yields_partial_results() {
    let dir = tempdir().unwrap();
    populate(dir.path());

    let (finder, _) = finder_stopping_at("checksum");
    let (groups, summary) = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();

    assert!(summary.interrupted);
    assert_eq!(summary.hashed_files, 0);
    assert!(groups.is_empty());
    assert_eq!(ExitCode::for_scan(summary.interrupted), ExitCode::Interrupted);
}

#[test]
fn test_stop_before_walk_is_not_an_error() {
    let dir = tempdir().unwrap();
    populate(dir.path());

    let token = CancellationToken::new();
    token.request();
    let finder = DuplicateFinder::new(FinderConfig::default().with_cancellation(token));

    let (groups, summary) = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();
    assert!(groups.is_empty());
    assert!(summary.interrupted);
}

#[test]
fn test_pass_stop_leaves_consistent_store() {
    let dir = tempdir().unwrap();
    let mut store = CandidateStore::new();
    for (i, size) in [3u64, 3, 5, 5, 8, 8, 8].iter().enumerate() {
        let path = dir.path().join(format!("f{i}"));
        fs::write(&path, vec![i as u8; *size as usize]).unwrap();
        store.insert(CandidateRecord::new(path, *size));
    }
    prefilter(&mut store, PrefilterOptions::default(), None);
    assert_eq!(store.len(), 7);

    let token = CancellationToken::new();
    token.request();
    let stats = run_pass(&mut store, &FingerprintPass::new(), Some(&token), None);

    assert!(stats.interrupted);
    assert_eq!(stats.groups, 0);
    assert_eq!(store.len(), 7);
    assert!(store.is_consistent());
    let first = store.first().unwrap();
    assert!(store.get(first).unwrap().interrupted);

    // The request was consumed; the next pass runs to completion
    assert!(!token.is_stop_requested());
    assert!(token.was_interrupted());
    let stats = run_pass(&mut store, &ByteSignaturePass::new(), Some(&token), None);
    assert!(!stats.interrupted);
    assert!(store.is_empty());
    assert!(store.is_consistent());
}

#[test]
fn test_second_request_escalates() {
    let token = CancellationToken::new();
    assert_eq!(
        token.request(),
        dupsift::signal::Escalation::Cooperative
    );
    assert!(token.acknowledge());
    assert_eq!(token.request(), dupsift::signal::Escalation::Terminate);
    assert_eq!(token.request_count(), 2);
}
