// vigil-core/src/infrastructure/fs.rs

use crate::domain::scan::ScanReport;
use crate::infrastructure::error::InfrastructureError;
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Writes `content` to `path` through a temporary file in the same directory,
/// so readers see either the previous file or the complete new one.
pub fn atomic_write<P: AsRef<Path>, C: AsRef<[u8]>>(
    path: P,
    content: C,
) -> Result<(), InfrastructureError> {
    let path = path.as_ref();
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(InfrastructureError::Io)?;

    let mut temp_file = tempfile::NamedTempFile::new_in(parent).map_err(InfrastructureError::Io)?;
    temp_file
        .write_all(content.as_ref())
        .map_err(InfrastructureError::Io)?;
    temp_file
        .persist(path)
        .map_err(|e| InfrastructureError::Io(e.error))?;

    Ok(())
}

/// Saves a scan report as pretty JSON.
pub fn write_scan_report(path: &Path, report: &ScanReport) -> Result<(), InfrastructureError> {
    let json = serde_json::to_string_pretty(report).map_err(InfrastructureError::JsonError)?;
    atomic_write(path, json)?;
    info!(path = ?path, "Scan report written");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;
    use chrono::Utc;
    use tempfile::tempdir;

    #[test]
    fn test_atomic_write_overwrites_existing() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("report.json");

        atomic_write(&file_path, "Initial")?;
        atomic_write(&file_path, "Updated")?;

        assert_eq!(fs::read_to_string(file_path)?, "Updated");
        Ok(())
    }

    #[test]
    fn test_report_lands_in_missing_directory() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("target").join("scan.json");

        write_scan_report(&path, &ScanReport::empty(Utc::now()))?;

        let parsed: ScanReport = serde_json::from_str(&fs::read_to_string(&path)?)?;
        assert_eq!(parsed.violations_found, 0);
        assert!(!parsed.cancelled);
        Ok(())
    }
}
