//! Naming and writing of result artifacts.
//!
//! Every job owns exactly one artifact in a shared directory, `mc_result_<job_id>.json` if it
//! succeeded or `mc_error_<job_id>.json` if it failed, so jobs never need to coordinate and the
//! aggregator can find all artifacts without a manifest.
use crate::error::{Error, Result};
use crate::jobs::JobOutcome;

use serde::Serialize;
use std::fmt::Display;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Prefix of the artifacts written by successful jobs.
pub const RESULT_PREFIX: &str = "mc_result_";

/// Prefix of the artifacts written by failed jobs.
pub const ERROR_PREFIX: &str = "mc_error_";

/// Name of the artifact written by the coordinator of a reduction.
pub const REDUCTION_FILE: &str = "mc_reduction.json";

const EXTENSION: &str = ".json";

/// The two kinds of job artifacts.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ArtifactKind {
    /// Written by a successful job.
    Result,
    /// Written by a failed job.
    Error,
}

/// Returns the path of the artifact of kind `kind` for job `job_id` in `dir`.
pub fn artifact_path(dir: &Path, kind: ArtifactKind, job_id: u64) -> PathBuf {
    let prefix = match kind {
        ArtifactKind::Result => RESULT_PREFIX,
        ArtifactKind::Error => ERROR_PREFIX,
    };

    dir.join(format!("{}{}{}", prefix, job_id, EXTENSION))
}

/// Recognizes the file name of a job artifact and returns its kind and job id.
pub(crate) fn parse_file_name(name: &str) -> Option<(ArtifactKind, u64)> {
    let stem = name.strip_suffix(EXTENSION)?;

    let (kind, id) = if let Some(id) = stem.strip_prefix(RESULT_PREFIX) {
        (ArtifactKind::Result, id)
    } else {
        (ArtifactKind::Error, stem.strip_prefix(ERROR_PREFIX)?)
    };

    // `parse` would accept a leading `+`
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    id.parse().ok().map(|id| (kind, id))
}

/// Serializes `value` as pretty-printed JSON to `path`.
///
/// The data is first written to a hidden file in the same directory, which is then renamed, so
/// readers either see the complete artifact or none at all.
pub fn write_json<S: Serialize + ?Sized>(path: &Path, value: &S) -> Result<()> {
    let name = path
        .file_name()
        .ok_or_else(|| Error::configuration(format!("`{}` is not a file", path.display())))?;
    let tmp = path.with_file_name(format!(".{}.tmp", name.to_string_lossy()));

    let mut writer = BufWriter::new(File::create(&tmp)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    drop(writer);

    fs::rename(&tmp, path)?;

    Ok(())
}

/// Writes the artifact for `outcome` into `dir`, creating the directory if needed, and returns
/// its path.
pub fn write_outcome<T>(dir: &Path, outcome: &JobOutcome<T>) -> Result<PathBuf>
where
    T: Copy + Display + Serialize,
{
    fs::create_dir_all(dir)?;

    let path = match outcome {
        JobOutcome::Completed(result) => {
            let path = artifact_path(dir, ArtifactKind::Result, result.job_id());
            write_json(&path, result)?;
            path
        }
        JobOutcome::Failed(failure) => {
            let path = artifact_path(dir, ArtifactKind::Error, failure.job_id());
            write_json(&path, failure)?;
            path
        }
    };

    debug!(path = %path.display(), "artifact written");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::FailureRecord;
    use chrono::Utc;
    use tempfile::tempdir;

    #[test]
    fn test_artifact_names() {
        let dir = Path::new("results");

        assert_eq!(
            artifact_path(dir, ArtifactKind::Result, 12),
            dir.join("mc_result_12.json")
        );
        assert_eq!(
            artifact_path(dir, ArtifactKind::Error, 3),
            dir.join("mc_error_3.json")
        );
    }

    #[test]
    fn test_parse_file_name() {
        assert_eq!(
            parse_file_name("mc_result_12.json"),
            Some((ArtifactKind::Result, 12))
        );
        assert_eq!(
            parse_file_name("mc_error_0.json"),
            Some((ArtifactKind::Error, 0))
        );
        assert_eq!(parse_file_name("mc_result_mpi.json"), None);
        assert_eq!(parse_file_name("mc_result_+1.json"), None);
        assert_eq!(parse_file_name("mc_result_.json"), None);
        assert_eq!(parse_file_name(".mc_result_1.json.tmp"), None);
        assert_eq!(parse_file_name(REDUCTION_FILE), None);
        assert_eq!(parse_file_name("monte_carlo_report.txt"), None);
    }

    #[test]
    fn test_write_failure() {
        let dir = tempdir().unwrap();
        let outcome = JobOutcome::<f64>::Failed(FailureRecord::new(5, "boom", Utc::now()));
        let path = write_outcome(dir.path(), &outcome).unwrap();

        assert_eq!(path, dir.path().join("mc_error_5.json"));

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["job_id"], 5);
        assert_eq!(json["error"], "boom");
        assert!(json["timestamp"].is_string());

        // no temporary file is left behind
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
