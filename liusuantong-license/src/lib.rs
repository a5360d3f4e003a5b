//! Offline licensing and activation for LiuSuanTong.
//!
//! This crate handles:
//! - Machine fingerprinting for node binding
//! - License key issuance (vendor keygen) and verification (application)
//! - Activation persistence and the launch-time state flow
//!
//! # Design Principles
//!
//! - **Fully offline**: no license server exists. The fingerprint travels to
//!   the vendor out of band (mail, chat) and the key travels back the same
//!   way; neither leg depends on transport secrecy.
//! - **Re-verify every launch**: the stored activation record is untrusted
//!   input and is checked against the live fingerprint each time.
//! - **Node binding**: a key is valid on exactly one fingerprint. There is
//!   no revocation and no expiry.
//!
//! # Key format
//!
//! `XXXX-XXXX-XXXX-XXXX-XXXX`: the first 20 uppercase hex characters of
//! `SHA-256(fingerprint || secret)` in dash-separated groups of four. Input
//! is accepted in any case, with or without dashes.
//!
//! # Threat model
//!
//! The secret is compiled into both shipped binaries, so anyone willing to
//! reverse-engineer either one can recover it and forge keys for arbitrary
//! fingerprints. The scheme defends against the weaker adversary who holds
//! only fingerprints and keys: a customer cannot mint a key for a second
//! machine, and an eavesdropper on the fingerprint/key exchange cannot mint
//! keys for other machines. Truncation to 20 hex digits leaves 80 bits of
//! effective strength, accepted at realistic installed-base sizes.

mod activation;
mod error;
mod fingerprint;
mod key;

pub use activation::{
    Activation, ActivationRecord, ActivationState, ActivationStore, PromptReason,
};
pub use error::{LicenseError, LicenseResult};
pub use fingerprint::{HostInfo, MachineFingerprint, FINGERPRINT_LEN};
pub use key::{
    issue, issue_with_secret, verify, verify_with_secret, LicenseKey, Verdict, KEY_DIGITS,
};
