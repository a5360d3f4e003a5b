//! Vendor-side license key generator. Internal tool, never shipped to
//! customers.
//!
//! Reads the fingerprint a customer copied out of their activation dialog
//! and prints the matching license key:
//!
//! ```text
//! $ liusuantong-keygen 4FB813C62AD79F55E47C1B1B61F74E2B
//! A583-261A-192D-35DB-513A
//! ```
//!
//! With no argument the fingerprint is read from stdin, so the tool also
//! works at the end of a pipe. The key goes to stdout alone; everything
//! else goes to stderr.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::io::Read;

/// Generate the license key for a customer fingerprint.
#[derive(Parser)]
#[command(name = "liusuantong-keygen", version)]
struct Args {
    /// Fingerprint exactly as shown in the customer's activation dialog.
    /// Read from stdin when omitted.
    fingerprint: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let fingerprint = match args.fingerprint {
        Some(fp) => fp,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading fingerprint from stdin")?;
            buf
        }
    };

    let fingerprint = fingerprint.trim();
    if fingerprint.is_empty() {
        bail!("fingerprint is empty; paste it exactly as shown in the customer's activation dialog");
    }

    let key = liusuantong_license::issue(fingerprint)?;
    println!("{key}");
    Ok(())
}
