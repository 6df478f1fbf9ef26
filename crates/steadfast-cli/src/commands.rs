//! Command implementations

use std::io::{Read, Write};

use steadfast_fs::{Fingerprint, NormalizedPath, Settings};
use tracing::debug;

use crate::error::{CliError, Result};

fn resolve(path: &str) -> Result<NormalizedPath> {
    Ok(NormalizedPath::parse(path)?)
}

pub fn run_read(settings: &Settings, path: &str) -> Result<()> {
    let mut file = settings.open(resolve(path)?);
    let content = file.read_bytes()?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&content)?;
    stdout.flush()?;
    Ok(())
}

pub fn run_write(settings: &Settings, path: &str, expect: Option<&str>) -> Result<()> {
    let mut file = settings.open(resolve(path)?);
    if let Some(expected) = expect {
        let fingerprint: Fingerprint = expected
            .parse()
            .map_err(|e: String| CliError::user(format!("--expect: {e}")))?;
        file.expect_fingerprint(fingerprint);
    }

    let mut content = Vec::new();
    std::io::stdin().lock().read_to_end(&mut content)?;
    debug!(path = %file.path(), bytes = content.len(), "Writing from stdin");

    file.write_bytes(&content)?;
    println!("{}", Fingerprint::of_bytes(&content));
    Ok(())
}

pub fn run_rm(settings: &Settings, path: &str) -> Result<()> {
    settings.open(resolve(path)?).remove()?;
    Ok(())
}

pub fn run_fingerprint(settings: &Settings, path: &str) -> Result<()> {
    let mut file = settings.open(resolve(path)?);
    let content = file.read_bytes()?;
    println!("{}", Fingerprint::of_bytes(&content));
    Ok(())
}
