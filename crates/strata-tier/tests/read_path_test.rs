//! End-to-end read path scenarios over real local and mirrored remote trees.

mod common;

use std::io::Read;

use common::{Harness, SeedRecovery, SyncedFile};
use strata_tier::{
    ContentHash, FileStorage, LocationLedger, RecoveryOutcome, RemoteStore, StoredFile, Tier,
    TierError,
};

#[test]
fn test_unmigrated_local_file_reads_back_exact_bytes() {
    let h = Harness::new(false, SeedRecovery::failing());
    let data = b"hello from the local tier";
    let hash = h.local.store(data).unwrap();
    let file = StoredFile::new(hash.clone(), data.len() as u64);

    let resolved = h.storage.resolve_path(&hash);
    assert_eq!(resolved, h.local_path(&hash));
    assert!(h.storage.is_readable(&file));
    h.storage.ensure_readable_or_fail(&file, &resolved).unwrap();

    assert_eq!(h.storage.read_all_bytes(&file).unwrap(), data);

    let mut out = Vec::new();
    assert_eq!(h.storage.send_file(&file, &mut out).unwrap(), data.len() as u64);
    assert_eq!(out, data);

    let mut handle = h.storage.open_handle(&file).unwrap();
    assert!(!handle.is_remote());
    let mut streamed = Vec::new();
    handle.read_to_end(&mut streamed).unwrap();
    assert_eq!(streamed, data);

    assert_eq!(h.recovery.attempts(), 0);
}

#[test]
fn test_external_file_reads_through_remote() {
    let h = Harness::new(false, SeedRecovery::failing());
    let data = b"only in the bucket";
    let hash = ContentHash::of(data);
    h.remote.seed(&hash, data);
    h.ledger.record(&hash, Tier::External).unwrap();
    let file = StoredFile::new(hash.clone(), data.len() as u64);

    let resolved = h.storage.resolve_path(&hash);
    assert!(!h.remote.path_is_local(&resolved));
    h.storage.ensure_readable_or_fail(&file, &resolved).unwrap();

    assert_eq!(h.storage.read_all_bytes(&file).unwrap(), data);
    let handle = h.storage.open_handle(&file).unwrap();
    assert!(handle.is_remote());

    assert!(!h.local.exists(&hash));
    assert_eq!(h.recovery.attempts(), 0);
}

#[test]
fn test_local_deleted_out_of_band_is_unreadable() {
    let h = Harness::new(false, SeedRecovery::failing());
    let hash = h.local.store(b"soon gone").unwrap();
    h.ledger.record(&hash, Tier::Local).unwrap();
    std::fs::remove_file(h.local.blob_path(&hash)).unwrap();
    let file = StoredFile::new(hash.clone(), 9);

    assert!(!h.storage.is_readable(&file));

    let resolved = h.storage.resolve_path(&hash);
    let err = h.storage.ensure_readable_or_fail(&file, &resolved).unwrap_err();
    match err {
        TierError::ContentUnreadable { hash: h2, path } => {
            assert_eq!(h2, hash);
            assert_eq!(path, h.local.blob_path(&hash));
        }
        other => panic!("expected ContentUnreadable, got {other:?}"),
    }

    assert!(matches!(
        h.storage.read_all_bytes(&file),
        Err(TierError::ContentUnreadable { .. })
    ));
    assert!(matches!(
        h.storage.open_handle(&file),
        Err(TierError::ContentUnreadable { .. })
    ));
}

#[test]
fn test_duplicated_prefers_local_by_default() {
    let h = Harness::new(false, SeedRecovery::failing());
    let data = b"in both places";
    let hash = h.local.store(data).unwrap();
    h.remote.seed(&hash, data);
    h.ledger.record(&hash, Tier::Duplicated).unwrap();

    assert_eq!(h.storage.resolve_path(&hash), h.local_path(&hash));

    let file = StoredFile::new(hash, data.len() as u64);
    assert!(!h.storage.open_handle(&file).unwrap().is_remote());
}

#[test]
fn test_duplicated_prefers_remote_when_configured() {
    let h = Harness::new(true, SeedRecovery::failing());
    let data = b"in both places";
    let hash = h.local.store(data).unwrap();
    h.remote.seed(&hash, data);
    h.ledger.record(&hash, Tier::Duplicated).unwrap();

    let file = StoredFile::new(hash, data.len() as u64);
    let handle = h.storage.open_handle(&file).unwrap();
    assert!(handle.is_remote());
}

#[test]
fn test_missing_remote_object_surfaces_from_remote_read() {
    let h = Harness::new(false, SeedRecovery::failing());
    let hash = ContentHash::of(b"lost in transit");
    h.ledger.record(&hash, Tier::External).unwrap();
    let file = StoredFile::new(hash, 15);

    // Guard passes, the read itself fails
    assert!(matches!(
        h.storage.read_all_bytes(&file),
        Err(TierError::Remote(_))
    ));
    assert_eq!(h.recovery.attempts(), 0);
}

#[test]
fn test_recovery_repairs_local_copy_before_read() {
    let data = b"restored bytes";
    let h = Harness::new(false, SeedRecovery::restoring(data));
    let hash = ContentHash::of(data);
    let file = StoredFile::new(hash.clone(), data.len() as u64);

    assert_eq!(h.storage.read_all_bytes(&file).unwrap(), data);
    assert_eq!(h.recovery.attempts(), 1);
    assert!(h.local.is_readable(&hash));

    // Second read finds the repaired copy
    assert_eq!(h.storage.read_all_bytes(&file).unwrap(), data);
    assert_eq!(h.recovery.attempts(), 1);
}

#[test]
fn test_external_sync_runs_once_per_read() {
    let h = Harness::new(false, SeedRecovery::failing());
    let hash = h.local.store(b"synced").unwrap();
    let file = SyncedFile::new(hash, 6);

    h.storage.read_all_bytes(&file).unwrap();
    assert_eq!(file.syncs(), 1);

    let mut out = Vec::new();
    h.storage.send_file(&file, &mut out).unwrap();
    assert_eq!(file.syncs(), 2);
}

#[test]
fn test_failed_sync_does_not_abort_read() {
    let h = Harness::new(false, SeedRecovery::failing());
    let hash = h.local.store(b"stale but present").unwrap();
    let mut file = SyncedFile::new(hash, 17);
    file.fail_sync = true;

    assert_eq!(h.storage.read_all_bytes(&file).unwrap(), b"stale but present");
    assert!(h.storage.is_readable(&file));
}

#[test]
fn test_unknown_ledger_code_reads_local() {
    let h = Harness::new(true, SeedRecovery::failing());
    let hash = h.local.store(b"mystery tier").unwrap();
    h.ledger.record_raw(&hash, 250);

    assert_eq!(h.storage.resolve_path(&hash), h.local_path(&hash));
    let file = StoredFile::new(hash, 12);
    assert_eq!(h.storage.read_all_bytes(&file).unwrap(), b"mystery tier");
}

#[test]
fn test_check_readable_reports_recovery_outcome() {
    let h = Harness::new(false, SeedRecovery::failing());
    let data = b"remote fallback";
    let hash = ContentHash::of(data);
    h.remote.seed(&hash, data);
    let file = StoredFile::new(hash, data.len() as u64);

    let report = h.storage.check_readable(&file);
    assert!(!report.local.readable);
    assert_eq!(report.local.recovery, RecoveryOutcome::Failed);
    assert_eq!(report.remote, Some(true));
    assert!(report.is_readable());
}

#[test]
fn test_concurrent_reads() {
    use rayon::prelude::*;

    let h = Harness::new(false, SeedRecovery::failing());
    let files: Vec<_> = (0..64u32)
        .map(|i| {
            let data = format!("blob number {i}");
            let hash = h.local.store(data.as_bytes()).unwrap();
            if i % 2 == 0 {
                h.remote.seed(&hash, data.as_bytes());
                h.ledger.record(&hash, Tier::External).unwrap();
            }
            (StoredFile::new(hash, data.len() as u64), data)
        })
        .collect();

    files.par_iter().for_each(|(file, data)| {
        assert_eq!(h.storage.read_all_bytes(file).unwrap(), data.as_bytes());
    });
}

#[cfg(target_os = "linux")]
#[test]
fn test_non_utf8_local_root_reads_back_exact_bytes() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;
    use std::sync::Arc;

    use strata_ledger::MemoryLedger;
    use strata_tier::{CasStore, MirrorRemote, NoRecovery, TierPolicy, TieredStorage};

    let temp = tempfile::TempDir::new().unwrap();
    let root = temp.path().join(OsStr::from_bytes(b"loc\xffal"));
    let local = CasStore::new(&root).unwrap();
    let data = b"bytes under an odd root";
    let hash = local.store(data).unwrap();

    let storage = TieredStorage::new(
        local,
        Arc::new(MirrorRemote::new(temp.path().join("remote")).unwrap()),
        Arc::new(MemoryLedger::new()),
        Arc::new(NoRecovery),
        TierPolicy::default(),
    );
    let file = StoredFile::new(hash, data.len() as u64);

    assert!(storage.is_readable(&file));
    assert_eq!(storage.read_all_bytes(&file).unwrap(), data);

    let mut streamed = Vec::new();
    storage.open_handle(&file).unwrap().read_to_end(&mut streamed).unwrap();
    assert_eq!(streamed, data);
}
