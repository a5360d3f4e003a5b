//! Shared test helpers for license tests.

#![allow(dead_code)]

use liusuantong_license::ActivationStore;

/// Secret distinct from the production one, for the `_with_secret` forms.
pub const TEST_SECRET: &[u8] = b"unit-test-secret";

/// The embedded production secret. Must match `src/key.rs`; the known
/// vectors below are derived from it.
pub const PROD_SECRET: &[u8] = b"LiuSuanTong_Chem_2026_@TopSecret!";

/// Known vectors under the production secret: first 20 hex digits of
/// `SHA-256(fingerprint || secret)`, dash-grouped.
pub const FP_A: &str = "TEST-MACHINE-0001";
pub const KEY_A: &str = "85C1-D4FE-4D68-CFC1-7974";
pub const KEY_A_BARE: &str = "85C1D4FE4D68CFC17974";

pub const FP_B: &str = "TEST-MACHINE-0002";
pub const KEY_B: &str = "7196-3988-6912-7E72-012F";

/// Returns a store rooted in a fresh temp dir, plus the dir guard that keeps
/// it alive.
pub fn temp_store() -> (tempfile::TempDir, ActivationStore) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let store = ActivationStore::at(dir.path().join("activation.json"));
    (dir, store)
}
