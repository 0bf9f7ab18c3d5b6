//! Signs a Medirec model directory.
//!
//! Writes `manifest.json` (SHA-256 of `model.json`) and `model.sig`
//! (Ed25519 signature over the manifest bytes) next to the model.
//!
//! # Usage
//!
//! ```bash
//! MEDIREC_MODEL_SIGNING_KEY_B64_FILE=seed.b64 cargo run --bin sign_model -- <model_dir> [--serial <n>]
//! ```
//!
//! The signing seed is read from `MEDIREC_MODEL_SIGNING_KEY_B64_FILE`, or in
//! debug builds from `MEDIREC_MODEL_SIGNING_KEY_B64`.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use base64::engine::general_purpose;
use base64::Engine;
use ed25519_dalek::{Signer, SigningKey};
use serde::Serialize;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

const KEY_FILE_ENV: &str = "MEDIREC_MODEL_SIGNING_KEY_B64_FILE";
const KEY_ENV_DEV: &str = "MEDIREC_MODEL_SIGNING_KEY_B64";
const BOUND_FILES: &[&str] = &["model.json"];

#[derive(Debug, Serialize)]
struct Manifest {
    version: u32,
    serial: u64,
    created_at: i64,
    files: BTreeMap<String, String>,
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn read_seed() -> Result<Zeroizing<[u8; 32]>> {
    let b64 = if let Ok(path) = env::var(KEY_FILE_ENV) {
        Zeroizing::new(
            fs::read_to_string(path.trim())
                .with_context(|| format!("Failed reading signing key file {path}"))?,
        )
    } else if cfg!(debug_assertions) {
        Zeroizing::new(env::var(KEY_ENV_DEV).map_err(|_| {
            anyhow!("Missing signing key: set {KEY_FILE_ENV} (or {KEY_ENV_DEV} in debug builds)")
        })?)
    } else {
        bail!("Missing signing key: set {KEY_FILE_ENV}");
    };

    let raw = Zeroizing::new(
        general_purpose::STANDARD
            .decode(b64.trim())
            .context("Invalid base64 in signing key")?,
    );
    let seed: [u8; 32] = raw
        .as_slice()
        .try_into()
        .map_err(|_| anyhow!("Signing seed must be 32 bytes (got {})", raw.len()))?;
    Ok(Zeroizing::new(seed))
}

fn usage() -> anyhow::Error {
    anyhow!("Usage: sign_model <model_dir> [--serial <u64>]")
}

fn parse_args() -> Result<(PathBuf, Option<u64>)> {
    let mut args = env::args().skip(1);
    let mut model_dir = None;
    let mut serial = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--serial" => {
                let v = args.next().ok_or_else(usage)?;
                serial = Some(v.trim().parse::<u64>().context("--serial must be a u64")?);
            }
            "-h" | "--help" => return Err(usage()),
            _ if model_dir.is_none() => model_dir = Some(PathBuf::from(arg)),
            _ => return Err(usage()),
        }
    }

    Ok((model_dir.ok_or_else(usage)?, serial))
}

fn main() -> Result<()> {
    let (model_dir, serial) = parse_args()?;
    if !model_dir.is_dir() {
        bail!("{model_dir:?} is not a directory");
    }

    let mut files = BTreeMap::new();
    for rel in BOUND_FILES {
        let bytes = fs::read(model_dir.join(rel))
            .with_context(|| format!("Failed to read {rel} in {model_dir:?}"))?;
        files.insert((*rel).to_string(), to_hex(&Sha256::digest(&bytes)));
    }

    let created_at = chrono::Utc::now().timestamp();
    let manifest = Manifest {
        version: 1,
        serial: serial.unwrap_or(created_at.max(1) as u64),
        created_at,
        files,
    };
    let manifest_bytes =
        serde_json::to_vec_pretty(&manifest).context("Failed to serialize manifest")?;

    let seed = read_seed()?;
    let signing_key = SigningKey::from_bytes(&seed);
    let signature = signing_key.sign(&manifest_bytes);

    let manifest_path = model_dir.join("manifest.json");
    fs::write(&manifest_path, &manifest_bytes)
        .with_context(|| format!("Failed to write {manifest_path:?}"))?;
    let sig_path = model_dir.join("model.sig");
    fs::write(&sig_path, signature.to_bytes())
        .with_context(|| format!("Failed to write {sig_path:?}"))?;

    println!("Signed manifest: {manifest_path:?}");
    println!("Wrote signature: {sig_path:?}");
    println!(
        "Public key (base64)={}",
        general_purpose::STANDARD.encode(signing_key.verifying_key().as_bytes())
    );
    Ok(())
}
