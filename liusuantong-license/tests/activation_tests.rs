mod common;

use common::{temp_store, FP_A, FP_B, KEY_A, KEY_A_BARE};
use liusuantong_license::{
    issue, Activation, ActivationRecord, ActivationState, ActivationStore, PromptReason, Verdict,
};

// ── Launch resolution ────────────────────────────────────────────

#[test]
fn fresh_install_prompts() {
    let (_dir, store) = temp_store();
    let session = Activation::launch_with_fingerprint(store, FP_A);
    assert_eq!(
        session.state(),
        &ActivationState::Prompt {
            reason: PromptReason::NotActivated
        }
    );
    assert!(!session.is_activated());
}

#[test]
fn valid_entry_activates_and_persists() {
    let (_dir, store) = temp_store();
    let mut session = Activation::launch_with_fingerprint(store.clone(), FP_A);

    assert_eq!(session.submit_key(KEY_A), Verdict::Valid);
    assert!(session.is_activated());

    let record = store.load().expect("record written");
    assert_eq!(record.key, KEY_A_BARE);
    assert_eq!(record.fingerprint, FP_A);
}

#[test]
fn relaunch_with_stored_key_is_activated() {
    let (_dir, store) = temp_store();
    let mut first = Activation::launch_with_fingerprint(store.clone(), FP_A);
    first.submit_key(KEY_A);

    let second = Activation::launch_with_fingerprint(store, FP_A);
    assert!(second.is_activated());
}

#[test]
fn invalid_entry_stays_at_prompt_and_writes_nothing() {
    let (_dir, store) = temp_store();
    let mut session = Activation::launch_with_fingerprint(store.clone(), FP_B);

    // KEY_A belongs to FP_A, not FP_B.
    assert_eq!(session.submit_key(KEY_A), Verdict::Invalid);
    assert_eq!(
        session.state(),
        &ActivationState::Prompt {
            reason: PromptReason::EnteredKeyInvalid
        }
    );
    assert!(store.load().is_none());
}

#[test]
fn malformed_entry_stays_at_prompt() {
    let (_dir, store) = temp_store();
    let mut session = Activation::launch_with_fingerprint(store.clone(), FP_A);

    assert_eq!(session.submit_key("garbage"), Verdict::Malformed);
    assert_eq!(
        session.state(),
        &ActivationState::Prompt {
            reason: PromptReason::EnteredKeyMalformed
        }
    );
    assert!(store.load().is_none());
}

#[test]
fn prompt_recovers_after_failed_attempt() {
    let (_dir, store) = temp_store();
    let mut session = Activation::launch_with_fingerprint(store, FP_A);

    assert_eq!(session.submit_key("garbage"), Verdict::Malformed);
    assert_eq!(session.submit_key(KEY_A), Verdict::Valid);
    assert!(session.is_activated());
}

#[test]
fn entered_key_accepted_in_any_form() {
    let (_dir, store) = temp_store();
    let mut session = Activation::launch_with_fingerprint(store, FP_A);
    let spaced = format!("  {}  ", KEY_A.to_lowercase());
    assert_eq!(session.submit_key(&spaced), Verdict::Valid);
}

// ── Host migration ───────────────────────────────────────────────

#[test]
fn fingerprint_change_returns_to_prompt_and_keeps_key() {
    let (_dir, store) = temp_store();
    let mut session = Activation::launch_with_fingerprint(store.clone(), FP_A);
    session.submit_key(KEY_A);

    // Same record, different machine.
    let migrated = Activation::launch_with_fingerprint(store.clone(), FP_B);
    assert_eq!(
        migrated.state(),
        &ActivationState::Prompt {
            reason: PromptReason::HostChanged
        }
    );
    // The key is not trusted, but it is not deleted either.
    assert!(store.load().is_some());
}

#[test]
fn migrated_host_can_activate_with_its_own_key() {
    let (_dir, store) = temp_store();
    let mut session = Activation::launch_with_fingerprint(store.clone(), FP_A);
    session.submit_key(KEY_A);

    let mut migrated = Activation::launch_with_fingerprint(store.clone(), FP_B);
    let key_b = issue(FP_B).unwrap();
    assert_eq!(migrated.submit_key(&key_b.formatted()), Verdict::Valid);

    let record = store.load().unwrap();
    assert_eq!(record.fingerprint, FP_B);
}

// ── Untrusted on-disk record ─────────────────────────────────────

#[test]
fn garbage_record_file_reprompts() {
    let (_dir, store) = temp_store();
    std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
    std::fs::write(store.path(), "not json at all").unwrap();

    let session = Activation::launch_with_fingerprint(store, FP_A);
    assert_eq!(
        session.state(),
        &ActivationState::Prompt {
            reason: PromptReason::NotActivated
        }
    );
}

#[test]
fn tampered_key_in_record_reprompts() {
    let (_dir, store) = temp_store();
    let record = ActivationRecord {
        key: "00000000000000000000".to_string(),
        fingerprint: FP_A.to_string(),
        activated_at: chrono::Utc::now(),
    };
    store.save(&record).unwrap();

    let session = Activation::launch_with_fingerprint(store, FP_A);
    assert_eq!(
        session.state(),
        &ActivationState::Prompt {
            reason: PromptReason::StoredKeyRejected
        }
    );
}

#[test]
fn unknown_fields_in_record_are_ignored() {
    let (_dir, store) = temp_store();
    std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
    let json = format!(
        r#"{{"key":"{KEY_A_BARE}","fingerprint":"{FP_A}","activated_at":"2026-01-15T08:30:00Z","edition":"pro"}}"#
    );
    std::fs::write(store.path(), json).unwrap();

    let session = Activation::launch_with_fingerprint(store, FP_A);
    assert!(session.is_activated());
}

#[test]
fn missing_fields_in_record_reprompt() {
    let (_dir, store) = temp_store();
    std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
    std::fs::write(store.path(), format!(r#"{{"key":"{KEY_A_BARE}"}}"#)).unwrap();

    let session = Activation::launch_with_fingerprint(store, FP_A);
    assert_eq!(
        session.state(),
        &ActivationState::Prompt {
            reason: PromptReason::NotActivated
        }
    );
}

// ── Persistence failure is non-fatal ─────────────────────────────

#[test]
fn activation_survives_unwritable_store() {
    let dir = tempfile::tempdir().unwrap();
    // The record path is the directory itself, so the write must fail.
    let store = ActivationStore::at(dir.path());
    let mut session = Activation::launch_with_fingerprint(store, FP_A);

    assert_eq!(session.submit_key(KEY_A), Verdict::Valid);
    assert!(session.is_activated());
}

// ── Store ────────────────────────────────────────────────────────

#[test]
fn store_save_load_roundtrip() {
    let (_dir, store) = temp_store();
    let record = ActivationRecord {
        key: KEY_A_BARE.to_string(),
        fingerprint: FP_A.to_string(),
        activated_at: chrono::Utc::now(),
    };
    store.save(&record).unwrap();

    let loaded = store.load().unwrap();
    assert_eq!(loaded.key, record.key);
    assert_eq!(loaded.fingerprint, record.fingerprint);
    assert_eq!(loaded.activated_at, record.activated_at);
}

#[test]
fn store_clear_removes_record() {
    let (_dir, store) = temp_store();
    let record = ActivationRecord {
        key: KEY_A_BARE.to_string(),
        fingerprint: FP_A.to_string(),
        activated_at: chrono::Utc::now(),
    };
    store.save(&record).unwrap();

    store.clear().unwrap();
    assert!(store.load().is_none());

    // Clearing an absent record is fine too.
    store.clear().unwrap();
}

#[test]
fn store_creates_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let store = ActivationStore::at(dir.path().join("nested").join("dirs").join("activation.json"));
    let record = ActivationRecord {
        key: KEY_A_BARE.to_string(),
        fingerprint: FP_A.to_string(),
        activated_at: chrono::Utc::now(),
    };
    store.save(&record).unwrap();
    assert!(store.load().is_some());
}

#[test]
fn record_serde_roundtrip() {
    let record = ActivationRecord {
        key: KEY_A_BARE.to_string(),
        fingerprint: FP_A.to_string(),
        activated_at: chrono::Utc::now(),
    };
    let json = serde_json::to_string(&record).unwrap();
    let restored: ActivationRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(restored.key, record.key);
    assert_eq!(restored.fingerprint, record.fingerprint);
}

#[test]
fn session_exposes_fingerprint_for_display() {
    let (_dir, store) = temp_store();
    let session = Activation::launch_with_fingerprint(store, FP_A);
    assert_eq!(session.fingerprint(), FP_A);
}
