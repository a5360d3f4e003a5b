//! License key issuance and verification.
//!
//! A key is the first 20 uppercase hex characters of
//! `SHA-256(fingerprint || secret)`, shown in five dash-separated groups of
//! four: `XXXX-XXXX-XXXX-XXXX-XXXX`. The vendor keygen and the customer
//! application compile in the same secret and must agree byte for byte.
//!
//! The digest is the plain hash of the concatenation rather than a keyed
//! MAC: every issued key pins the construction, and the digest is never
//! exposed as a MAC over attacker-chosen suffixes, so length extension does
//! not apply.

use crate::error::{LicenseError, LicenseResult};
use crate::fingerprint::MachineFingerprint;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use subtle::ConstantTimeEq;

/// Number of hex digits in a key, before dash grouping.
pub const KEY_DIGITS: usize = 20;

/// Digits per dash group in the display form.
const GROUP: usize = 4;

/// Embedded issuing secret, compiled into both the vendor keygen and the
/// customer application. The sole asymmetry that keeps customers from
/// issuing their own keys.
pub(crate) const LICENSE_SECRET: &[u8] = b"LiuSuanTong_Chem_2026_@TopSecret!";

/// Outcome of checking a candidate key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// The candidate is the key issued for this fingerprint.
    Valid,
    /// Well-formed, but issued for some other fingerprint (or never issued).
    Invalid,
    /// Does not normalize to exactly 20 hex characters.
    Malformed,
}

impl Verdict {
    /// Returns true for [`Verdict::Valid`].
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// A license key in canonical form: exactly [`KEY_DIGITS`] uppercase hex
/// characters, no separators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LicenseKey {
    digits: String,
}

impl LicenseKey {
    /// Parses user- or disk-supplied input into canonical form.
    ///
    /// Accepts the dashed display form and the bare 20-digit form, any case,
    /// with whitespace anywhere.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::MalformedKey`] if the input does not
    /// normalize to exactly 20 hex characters.
    pub fn parse(input: &str) -> LicenseResult<Self> {
        let digits: String = input
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .map(|c| c.to_ascii_uppercase())
            .collect();

        if digits.len() != KEY_DIGITS || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(LicenseError::MalformedKey);
        }

        Ok(Self { digits })
    }

    /// Canonical 20-digit form, as stored and compared.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.digits
    }

    /// Dashed display form: `XXXX-XXXX-XXXX-XXXX-XXXX`.
    #[must_use]
    pub fn formatted(&self) -> String {
        let mut out = String::with_capacity(KEY_DIGITS + KEY_DIGITS / GROUP - 1);
        for (i, c) in self.digits.chars().enumerate() {
            if i > 0 && i % GROUP == 0 {
                out.push('-');
            }
            out.push(c);
        }
        out
    }
}

impl fmt::Display for LicenseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.formatted())
    }
}

/// Issues the license key for a fingerprint under the embedded secret.
///
/// Deterministic: the same fingerprint always yields the same key. The
/// fingerprint is trimmed of surrounding whitespace, case preserved.
///
/// # Errors
///
/// Returns [`LicenseError::EmptyFingerprint`] if the fingerprint is empty
/// after trimming. There are no other failure modes.
pub fn issue(fingerprint: &str) -> LicenseResult<LicenseKey> {
    issue_with_secret(fingerprint, LICENSE_SECRET)
}

/// Issues a key under an explicit secret.
///
/// Production code goes through [`issue`]; this form exists so tests can
/// pin their own secret.
pub fn issue_with_secret(fingerprint: &str, secret: &[u8]) -> LicenseResult<LicenseKey> {
    let fingerprint = fingerprint.trim();
    if fingerprint.is_empty() {
        return Err(LicenseError::EmptyFingerprint);
    }
    Ok(LicenseKey {
        digits: digest_prefix(fingerprint, secret),
    })
}

/// Checks a candidate key against the current machine.
///
/// # Errors
///
/// Propagates [`LicenseError::FingerprintUnavailable`] from fingerprint
/// collection; every other condition is reported through the returned
/// [`Verdict`].
pub fn verify(candidate: &str) -> LicenseResult<Verdict> {
    let fingerprint = MachineFingerprint::collect()?;
    Ok(verify_with_secret(candidate, fingerprint.as_str(), LICENSE_SECRET))
}

/// Checks a candidate key against an explicit fingerprint and secret.
///
/// Total: malformed input yields [`Verdict::Malformed`], never an error.
/// The digest comparison is constant-time.
pub fn verify_with_secret(candidate: &str, fingerprint: &str, secret: &[u8]) -> Verdict {
    let Ok(key) = LicenseKey::parse(candidate) else {
        return Verdict::Malformed;
    };

    let fingerprint = fingerprint.trim();
    if fingerprint.is_empty() {
        // No key was ever issued for an empty fingerprint.
        return Verdict::Invalid;
    }

    let expected = digest_prefix(fingerprint, secret);
    if bool::from(expected.as_bytes().ct_eq(key.as_str().as_bytes())) {
        Verdict::Valid
    } else {
        Verdict::Invalid
    }
}

/// Verdict for a candidate against an explicit fingerprint under the
/// embedded secret. Used by the activation layer, which carries the
/// fingerprint it collected at launch.
pub(crate) fn verify_against(candidate: &str, fingerprint: &str) -> Verdict {
    verify_with_secret(candidate, fingerprint, LICENSE_SECRET)
}

/// First [`KEY_DIGITS`] uppercase hex characters of
/// `SHA-256(fingerprint || secret)`.
fn digest_prefix(fingerprint: &str, secret: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(fingerprint.as_bytes());
    hasher.update(secret);
    let mut digits = hex::encode_upper(hasher.finalize());
    digits.truncate(KEY_DIGITS);
    digits
}
