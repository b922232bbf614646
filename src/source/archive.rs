use std::fs::File;
use std::path::Path;

use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{Result, SubextractError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    Rar,
    SevenZip,
}

impl ArchiveKind {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "zip" => Some(ArchiveKind::Zip),
            "rar" => Some(ArchiveKind::Rar),
            "7z" => Some(ArchiveKind::SevenZip),
            _ => None,
        }
    }
}

/// Unpack `archive` into `dest`.
///
/// ZIP files are read in-process; RAR and 7z archives are handed to the
/// external `tool` (a 7-Zip compatible command).
pub async fn unpack(archive: &Path, kind: ArchiveKind, dest: &Path, tool: &str) -> Result<()> {
    info!("Unpacking {} into {}", archive.display(), dest.display());

    match kind {
        ArchiveKind::Zip => {
            let archive = archive.to_path_buf();
            let dest = dest.to_path_buf();
            tokio::task::spawn_blocking(move || -> Result<()> {
                let file = File::open(&archive)?;
                let mut zip = zip::ZipArchive::new(file)?;
                zip.extract(&dest)?;
                Ok(())
            })
            .await
            .map_err(|e| SubextractError::Archive(format!("Unpack task failed: {e}")))?
        }
        ArchiveKind::Rar | ArchiveKind::SevenZip => {
            let mut out_dir = std::ffi::OsString::from("-o");
            out_dir.push(dest.as_os_str());

            let output = Command::new(tool)
                .arg("x")
                .arg("-y")
                .arg(out_dir)
                .arg(archive)
                .output()
                .await
                .map_err(|e| {
                    SubextractError::Archive(format!(
                        "Failed to run {tool}. Install 7-Zip to open RAR/7z archives. Error: {e}"
                    ))
                })?;

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(SubextractError::Archive(format!("{tool} failed: {stderr}")));
            }

            debug!("{} output: {}", tool, String::from_utf8_lossy(&output.stdout));
            Ok(())
        }
    }
}
