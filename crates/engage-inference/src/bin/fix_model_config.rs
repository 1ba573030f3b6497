//! Rewrite a legacy Keras model config so current loaders accept it.
//!
//! Usage: `fix-model-config [path]` (default `saved_models/1/model_config.json`).
//! A `<path>.backup` copy is made before the first rewrite and restored if the
//! rewritten file does not parse.

use std::path::{Path, PathBuf};

use engage_inference::fix_keras_config;

const DEFAULT_CONFIG_PATH: &str = "saved_models/1/model_config.json";

fn main() -> anyhow::Result<()> {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    if !path.exists() {
        return Err(anyhow::anyhow!("model config not found at {}", path.display()));
    }

    let backup = backup_path(&path);
    if backup.exists() {
        println!("fix-model-config: backup already exists at {}", backup.display());
    } else {
        std::fs::copy(&path, &backup)?;
        println!("fix-model-config: created backup at {}", backup.display());
    }

    if let Err(e) = rewrite(&path) {
        eprintln!("fix-model-config: {e}; restoring backup");
        std::fs::copy(&backup, &path)?;
        return Err(e);
    }

    println!("fix-model-config: ok");
    Ok(())
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".backup");
    PathBuf::from(name)
}

fn rewrite(path: &Path) -> anyhow::Result<()> {
    let mut config: serde_json::Value = serde_json::from_slice(&std::fs::read(path)?)?;
    let report = fix_keras_config(&mut config);

    for fix in &report.batch_norm_axes {
        println!("  BatchNormalization {}: axis {} -> {}", fix.layer, fix.from, fix.to);
    }
    for layer in &report.lstm_time_major {
        println!("  LSTM {}: removed time_major", layer);
    }

    std::fs::write(path, serde_json::to_vec(&config)?)?;

    // Verify the rewritten file loads back.
    let _: serde_json::Value = serde_json::from_slice(&std::fs::read(path)?)
        .map_err(|e| anyhow::anyhow!("rewritten config does not parse: {e}"))?;

    println!("fix-model-config: {} change(s)", report.total());
    Ok(())
}
