//! Activation lifecycle and on-disk record.
//!
//! The application re-verifies on every launch. The stored record is
//! untrusted input: a record that cannot be read or decoded is treated as
//! absent, and a record whose key no longer matches the live fingerprint
//! sends the user back to the prompt. Nothing here touches the network.

use crate::error::{LicenseError, LicenseResult};
use crate::fingerprint::MachineFingerprint;
use crate::key::{self, LicenseKey, Verdict};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Product directory under the per-user configuration directory.
const CONFIG_DIR: &str = "liusuantong";

/// File name of the activation record inside the product directory.
const RECORD_FILE: &str = "activation.json";

/// What the application persists after a successful activation.
///
/// The fingerprint is stored so a host migration can be named in the prompt;
/// it carries no security weight, since verification always recomputes from
/// the live fingerprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivationRecord {
    /// Canonical (bare 20-digit) key.
    pub key: String,
    /// Fingerprint observed at activation time.
    pub fingerprint: String,
    /// When the activation happened.
    pub activated_at: DateTime<Utc>,
}

/// Loads and saves the activation record.
#[derive(Debug, Clone)]
pub struct ActivationStore {
    path: PathBuf,
}

impl ActivationStore {
    /// Store at the default per-user location:
    /// `{config_dir}/liusuantong/activation.json`.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::Persistence`] if the current user has no
    /// configuration directory.
    pub fn open_default() -> LicenseResult<Self> {
        let base = dirs::config_dir().ok_or_else(|| {
            LicenseError::Persistence(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no per-user configuration directory",
            ))
        })?;
        Ok(Self {
            path: base.join(CONFIG_DIR).join(RECORD_FILE),
        })
    }

    /// Store at an explicit path.
    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the record file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the record, treating every failure as "no record".
    ///
    /// Unknown fields in the file are ignored; missing fields or garbage
    /// make the record absent, never a crash.
    #[must_use]
    pub fn load(&self) -> Option<ActivationRecord> {
        let raw = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(record) => {
                debug!(path = %self.path.display(), "loaded activation record");
                Some(record)
            }
            Err(err) => {
                warn!(path = %self.path.display(), %err, "activation record undecodable, ignoring");
                None
            }
        }
    }

    /// Writes the record, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::Persistence`] on I/O failure.
    pub fn save(&self, record: &ActivationRecord) -> LicenseResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(record)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    /// Removes the record (manual reset). Removing a record that does not
    /// exist is not an error.
    pub fn clear(&self) -> LicenseResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Why the activation prompt is showing. `Display` gives the user-facing
/// message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptReason {
    /// No key has ever been entered on this machine.
    NotActivated,
    /// A record exists but was written on a different machine. The key stays
    /// on disk; it is just not trusted here.
    HostChanged,
    /// The stored key no longer matches this machine.
    StoredKeyRejected,
    /// The user entered something that is not a key.
    EnteredKeyMalformed,
    /// The user entered a well-formed key issued for some other machine.
    EnteredKeyInvalid,
}

impl fmt::Display for PromptReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::NotActivated => "enter a license key to activate",
            Self::HostChanged => "this license was activated on a different machine",
            Self::StoredKeyRejected => "the stored license key does not match this machine",
            Self::EnteredKeyMalformed => "license key format not recognized",
            Self::EnteredKeyInvalid => "license key does not match this machine",
        };
        f.write_str(msg)
    }
}

/// Where the application is in the activation flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationState {
    /// A key matching the current fingerprint has been verified.
    Activated {
        /// The verified key.
        key: LicenseKey,
    },
    /// Waiting for the user to enter a key.
    Prompt {
        /// What to tell the user.
        reason: PromptReason,
    },
}

impl ActivationState {
    /// Returns true when the session is activated.
    #[must_use]
    pub fn is_activated(&self) -> bool {
        matches!(self, Self::Activated { .. })
    }
}

/// Launch-time activation session.
///
/// Created fresh on every launch; once activated it stays activated for the
/// process lifetime. There is no network call, no grace period and nothing
/// to retry.
#[derive(Debug)]
pub struct Activation {
    store: ActivationStore,
    fingerprint: String,
    state: ActivationState,
}

impl Activation {
    /// Opens the session: collects the live fingerprint, checks any stored
    /// record and resolves the initial state.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::FingerprintUnavailable`] if this machine has
    /// no stable identifier. The application cannot be activated and must
    /// not proceed.
    pub fn launch(store: ActivationStore) -> LicenseResult<Self> {
        let fingerprint = MachineFingerprint::collect()?;
        Ok(Self::launch_with_fingerprint(store, fingerprint.as_str()))
    }

    /// Opens the session against an explicit fingerprint string.
    ///
    /// Production code goes through [`Activation::launch`].
    #[must_use]
    pub fn launch_with_fingerprint(store: ActivationStore, fingerprint: impl Into<String>) -> Self {
        let fingerprint = fingerprint.into();
        let state = initial_state(&store, &fingerprint);
        Self {
            store,
            fingerprint,
            state,
        }
    }

    /// The fingerprint this session verifies against, for display in the
    /// activation dialog.
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Current state of the session.
    #[must_use]
    pub fn state(&self) -> &ActivationState {
        &self.state
    }

    /// Returns true when the session is activated.
    #[must_use]
    pub fn is_activated(&self) -> bool {
        self.state.is_activated()
    }

    /// Feeds a user-entered key to the verifier.
    ///
    /// On [`Verdict::Valid`] the record is persisted and the session becomes
    /// activated. A persistence failure is non-fatal: the session stays
    /// activated in memory and the user will be prompted again next launch.
    /// On [`Verdict::Invalid`] or [`Verdict::Malformed`] the session stays
    /// at the prompt with the matching reason, and nothing is written.
    pub fn submit_key(&mut self, input: &str) -> Verdict {
        let Ok(key) = LicenseKey::parse(input) else {
            self.state = ActivationState::Prompt {
                reason: PromptReason::EnteredKeyMalformed,
            };
            return Verdict::Malformed;
        };

        if !key::verify_against(key.as_str(), &self.fingerprint).is_valid() {
            self.state = ActivationState::Prompt {
                reason: PromptReason::EnteredKeyInvalid,
            };
            return Verdict::Invalid;
        }

        let record = ActivationRecord {
            key: key.as_str().to_string(),
            fingerprint: self.fingerprint.clone(),
            activated_at: Utc::now(),
        };
        if let Err(err) = self.store.save(&record) {
            warn!(%err, "could not persist activation record, staying activated in memory");
        }

        self.state = ActivationState::Activated { key };
        Verdict::Valid
    }
}

/// Resolves the launch state from the stored record, if any.
fn initial_state(store: &ActivationStore, fingerprint: &str) -> ActivationState {
    let Some(record) = store.load() else {
        return ActivationState::Prompt {
            reason: PromptReason::NotActivated,
        };
    };

    if record.fingerprint != fingerprint {
        return ActivationState::Prompt {
            reason: PromptReason::HostChanged,
        };
    }

    let Ok(key) = LicenseKey::parse(&record.key) else {
        return ActivationState::Prompt {
            reason: PromptReason::StoredKeyRejected,
        };
    };

    if key::verify_against(key.as_str(), fingerprint).is_valid() {
        ActivationState::Activated { key }
    } else {
        ActivationState::Prompt {
            reason: PromptReason::StoredKeyRejected,
        }
    }
}
