//! Readability, recovery short-circuit and migration precondition tests.

mod common;

use common::{Harness, SeedRecovery};
use strata_tier::{
    ContentHash, LocationLedger, RecoveryOutcome, RemoteStore, StoredFile, Tier, TierError,
};

#[test]
fn test_recovered_local_copy_never_consults_remote() {
    let data = b"rebuilt from upstream";
    let h = Harness::new(false, SeedRecovery::restoring(data));
    let hash = ContentHash::of(data);
    let file = StoredFile::new(hash.clone(), data.len() as u64);

    let report = h.storage.check_readable(&file);

    assert!(report.is_readable());
    assert_eq!(report.local.recovery, RecoveryOutcome::Restored);
    assert_eq!(report.remote, None);
    assert_eq!(h.remote.calls(), 0);
    assert_eq!(h.recovery.attempts(), 1);
}

#[test]
fn test_readable_local_copy_skips_recovery_and_remote() {
    let h = Harness::new(false, SeedRecovery::failing());
    let hash = h.local.store(b"already here").unwrap();
    let file = StoredFile::new(hash, 12);

    let report = h.storage.check_readable(&file);
    assert!(report.local.readable);
    assert_eq!(report.local.recovery, RecoveryOutcome::NotAttempted);
    assert_eq!(h.remote.calls(), 0);
    assert_eq!(h.recovery.attempts(), 0);
}

#[test]
fn test_unreadable_everywhere() {
    let h = Harness::new(false, SeedRecovery::failing());
    let file = StoredFile::new(ContentHash::of(b"nowhere"), 7);

    let report = h.storage.check_readable(&file);
    assert!(!report.is_readable());
    assert_eq!(report.local.recovery, RecoveryOutcome::Failed);
    assert_eq!(report.remote, Some(false));
}

#[test]
fn test_is_readable_by_hash_is_a_pure_or() {
    let h = Harness::new(false, SeedRecovery::restoring(b"should never be written"));

    let neither = ContentHash::of(b"neither");
    let local_only = h.local.store(b"local only").unwrap();
    let remote_only = ContentHash::of(b"remote only");
    h.remote.seed(&remote_only, b"remote only");
    let both = h.local.store(b"both").unwrap();
    h.remote.seed(&both, b"both");

    for _ in 0..3 {
        assert!(!h.storage.is_readable_by_hash(&neither));
        assert!(h.storage.is_readable_by_hash(&local_only));
        assert!(h.storage.is_readable_by_hash(&remote_only));
        assert!(h.storage.is_readable_by_hash(&both));
    }

    // No recovery, no repair side effects
    assert_eq!(h.recovery.attempts(), 0);
    assert!(!h.local.exists(&neither));
    assert!(!h.local.exists(&remote_only));
}

#[test]
fn test_is_readable_by_hash_short_circuits_on_local() {
    let h = Harness::new(false, SeedRecovery::failing());
    let hash = h.local.store(b"local").unwrap();
    assert!(h.storage.is_readable_by_hash(&hash));
    assert_eq!(h.remote.calls(), 0);
}

#[test]
fn test_guard_is_noop_for_remote_paths() {
    let h = Harness::new(false, SeedRecovery::restoring(b"x"));
    let hash = ContentHash::of(b"missing remotely too");
    h.ledger.record(&hash, Tier::External).unwrap();
    let file = StoredFile::new(hash.clone(), 3);

    let resolved = h.storage.resolve_path(&hash);
    assert!(!h.remote.path_is_local(&resolved));
    h.remote.reset();

    h.storage.ensure_readable_or_fail(&file, &resolved).unwrap();
    assert_eq!(h.recovery.attempts(), 0);
    assert_eq!(h.remote.calls(), 0);
    assert!(!h.local.exists(&hash));
}

#[test]
fn test_guard_recovers_local_path() {
    let data = b"guarded";
    let h = Harness::new(false, SeedRecovery::restoring(data));
    let hash = ContentHash::of(data);
    let file = StoredFile::new(hash.clone(), data.len() as u64);

    let resolved = h.storage.resolve_path(&hash);
    h.storage.ensure_readable_or_fail(&file, &resolved).unwrap();
    assert_eq!(h.recovery.attempts(), 1);
    assert!(h.local.is_readable(&hash));
}

#[test]
fn test_copy_local_to_remote_requires_readable_source() {
    let h = Harness::new(false, SeedRecovery::failing());
    let hash = ContentHash::of(b"never stored locally");

    assert!(!h.storage.copy_local_to_remote(&hash));
    assert_eq!(h.remote.uploads(), 0);
    assert_eq!(h.recovery.attempts(), 1);
    assert!(matches!(
        h.storage.try_copy_local_to_remote(&hash),
        Err(TierError::ContentUnreadable { .. })
    ));
    assert_eq!(h.remote.uploads(), 0);
}

#[test]
fn test_copy_local_to_remote_uploads() {
    let h = Harness::new(false, SeedRecovery::failing());
    let hash = h.local.store(b"going up").unwrap();

    assert!(h.storage.copy_local_to_remote(&hash));
    assert_eq!(h.remote.uploads(), 1);
    assert!(h.remote.holds(&hash));
}

#[test]
fn test_copy_remote_to_local_restores() {
    let h = Harness::new(false, SeedRecovery::failing());
    let data = b"coming down";
    let hash = ContentHash::of(data);
    h.remote.seed(&hash, data);

    assert!(h.storage.copy_remote_to_local(&hash));
    assert_eq!(h.local.read(&hash).unwrap(), data);
}

#[test]
fn test_copy_remote_to_local_missing_reports_failure() {
    let h = Harness::new(false, SeedRecovery::failing());
    let hash = ContentHash::of(b"not in remote");

    assert!(!h.storage.copy_remote_to_local(&hash));
    assert!(matches!(
        h.storage.try_copy_remote_to_local(&hash),
        Err(TierError::CopyFailed { .. })
    ));
}

#[test]
fn test_delete_local_after_migration() {
    let h = Harness::new(false, SeedRecovery::failing());
    let data = b"migrating out";
    let hash = h.local.store(data).unwrap();

    assert!(h.storage.copy_local_to_remote(&hash));
    h.ledger.record(&hash, Tier::Duplicated).unwrap();
    assert!(h.storage.delete_local(&hash));
    h.ledger.record(&hash, Tier::External).unwrap();

    assert!(!h.local.exists(&hash));
    assert!(h.storage.is_readable_by_hash(&hash));
    let file = StoredFile::new(hash, data.len() as u64);
    assert!(h.storage.is_readable(&file));
}

#[test]
fn test_delete_local_requires_readable_copy() {
    let h = Harness::new(false, SeedRecovery::failing());
    let hash = ContentHash::of(b"nothing to delete");
    assert!(!h.storage.delete_local(&hash));
    assert_eq!(h.recovery.attempts(), 1);
}
