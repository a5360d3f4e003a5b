//! Machine fingerprinting.
//!
//! Derives the stable identifier a license key is bound to. The attribute
//! mix and read order are load-bearing: changing either invalidates every
//! previously issued key.
//!
//! Attributes, in order:
//! 1. Machine UUID as reported by the OS (administrator-controlled, not
//!    trivially user-editable).
//! 2. Hardware address of the first non-loopback network interface
//!    (survives a clean OS reinstall on the same hardware).
//!
//! Hostname and username are not part of the mix; both can be renamed at
//! will, which would orphan the key.

use crate::error::{LicenseError, LicenseResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::env;
use std::fmt;

/// Length of the rendered fingerprint in hex characters.
pub const FINGERPRINT_LEN: usize = 32;

/// The stable identifier of this machine, as shown to the user and sent to
/// the vendor when requesting a key.
///
/// Always exactly [`FINGERPRINT_LEN`] uppercase hex characters, so it
/// survives email and chat transports unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MachineFingerprint {
    id: String,
}

impl MachineFingerprint {
    /// Derives the fingerprint for the current machine.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::FingerprintUnavailable`] if no stable host
    /// attribute can be read. Callers must refuse to proceed rather than
    /// substitute a random value.
    pub fn collect() -> LicenseResult<Self> {
        let attributes = collect_host_attributes();
        if attributes.is_empty() {
            return Err(LicenseError::FingerprintUnavailable);
        }
        Ok(Self::derive(&attributes))
    }

    fn derive(attributes: &[String]) -> Self {
        let combined = attributes.join("|");
        let digest = Sha256::digest(combined.as_bytes());
        let mut id = hex::encode_upper(digest);
        id.truncate(FINGERPRINT_LEN);
        Self { id }
    }

    /// Returns the fingerprint string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.id
    }

    /// Returns true if a previously recorded fingerprint string refers to
    /// this machine.
    #[must_use]
    pub fn matches(&self, recorded: &str) -> bool {
        self.id == recorded
    }
}

impl fmt::Display for MachineFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Host details shown next to the fingerprint in the activation dialog and
/// in the host-migration message. Plays no part in key derivation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostInfo {
    /// Hostname.
    pub hostname: String,
    /// Operating system name.
    pub os_name: String,
    /// Operating system version.
    pub os_version: String,
    /// CPU architecture.
    pub arch: String,
}

impl HostInfo {
    /// Collects display information about the current host.
    #[must_use]
    pub fn collect() -> Self {
        Self {
            hostname: get_hostname(),
            os_name: env::consts::OS.to_string(),
            os_version: get_os_version(),
            arch: env::consts::ARCH.to_string(),
        }
    }
}

/// Reads the fingerprint attributes in their documented order, skipping any
/// that cannot be read.
fn collect_host_attributes() -> Vec<String> {
    let mut attributes = Vec::new();

    if let Some(uuid) = machine_uuid() {
        attributes.push(uuid);
    }

    if let Some(mac) = primary_mac() {
        attributes.push(mac);
    }

    attributes
}

/// Gets the machine hostname.
fn get_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Gets the OS version string.
fn get_os_version() -> String {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("sw_vers")
            .arg("-productVersion")
            .output()
            .ok()
            .and_then(|o| String::from_utf8(o.stdout).ok())
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "ver"])
            .output()
            .ok()
            .and_then(|o| String::from_utf8(o.stdout).ok())
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }

    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/etc/os-release")
            .ok()
            .and_then(|content| {
                content
                    .lines()
                    .find(|l| l.starts_with("VERSION_ID="))
                    .map(|l| {
                        l.trim_start_matches("VERSION_ID=")
                            .trim_matches('"')
                            .to_string()
                    })
            })
            .unwrap_or_else(|| "unknown".to_string())
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
    {
        "unknown".to_string()
    }
}

/// Gets the machine UUID (platform-specific unique identifier).
fn machine_uuid() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/etc/machine-id")
            .or_else(|_| std::fs::read_to_string("/var/lib/dbus/machine-id"))
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("ioreg")
            .args(["-rd1", "-c", "IOPlatformExpertDevice"])
            .output()
            .ok()
            .and_then(|o| String::from_utf8(o.stdout).ok())
            .and_then(|output| {
                output
                    .lines()
                    .find(|l| l.contains("IOPlatformUUID"))
                    .and_then(|l| l.split('"').nth(3))
                    .map(String::from)
            })
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("reg")
            .args([
                "query",
                r"HKLM\SOFTWARE\Microsoft\Cryptography",
                "/v",
                "MachineGuid",
            ])
            .output()
            .ok()
            .and_then(|o| String::from_utf8(o.stdout).ok())
            .and_then(|output| {
                output
                    .split_whitespace()
                    .last()
                    .map(str::to_string)
                    .filter(|s| s.len() == 36)
            })
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
    {
        None
    }
}

/// Gets the hardware address of the first non-loopback network interface.
fn primary_mac() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        let mut names: Vec<String> = std::fs::read_dir("/sys/class/net")
            .ok()?
            .flatten()
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|name| name != "lo")
            .collect();
        // read_dir order is not stable across boots; the name sort is part
        // of the derivation.
        names.sort();

        for name in names {
            let addr_path = format!("/sys/class/net/{name}/address");
            if let Ok(addr) = std::fs::read_to_string(&addr_path) {
                let addr = addr.trim();
                if !addr.is_empty() && addr != "00:00:00:00:00:00" {
                    return Some(addr.to_string());
                }
            }
        }
        None
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("ifconfig")
            .arg("en0")
            .output()
            .ok()
            .and_then(|o| String::from_utf8(o.stdout).ok())
            .and_then(|output| {
                output
                    .lines()
                    .find_map(|l| l.trim().strip_prefix("ether ").map(|m| m.trim().to_string()))
            })
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("getmac")
            .args(["/FO", "CSV", "/NH"])
            .output()
            .ok()
            .and_then(|o| String::from_utf8(o.stdout).ok())
            .and_then(|output| {
                output
                    .lines()
                    .filter_map(|l| l.split(',').next())
                    .map(|field| field.trim_matches('"').to_string())
                    .find(|mac| mac.len() == 17 && !mac.starts_with("00-00-00"))
            })
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
    {
        None
    }
}
