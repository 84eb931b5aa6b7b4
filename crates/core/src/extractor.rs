//! Resolves where a completed run's real result lives and normalizes it
//! into output lines.
//!
//! Most modes write a transient artifact at the derived output path. The
//! metadata mode prints to stdout instead, so the captured stdout is the
//! fallback when no artifact was written. Absence of output is a valid
//! completion outcome, not an error.

use std::path::Path;

use tokio::fs;

use crate::job::ScrapMode;
use crate::runner::ProcessOutcome;

/// Extract the result of a clean engine run as an ordered sequence of lines.
///
/// If the derived artifact exists it is read, split into lines, and deleted
/// (it is transient, not retained). Otherwise, for the metadata mode the
/// captured stdout is split instead. All other cases yield an empty sequence.
pub async fn extract(
    mode: ScrapMode,
    output_path: &Path,
    outcome: &ProcessOutcome,
) -> std::io::Result<Vec<String>> {
    if fs::metadata(output_path).await.is_ok() {
        let contents = fs::read_to_string(output_path).await?;
        let lines = split_lines(&contents);
        fs::remove_file(output_path).await?;
        return Ok(lines);
    }

    if mode == ScrapMode::Metadata {
        return Ok(split_lines(&outcome.stdout));
    }

    Ok(Vec::new())
}

fn split_lines(text: &str) -> Vec<String> {
    text.lines().map(str::to_string).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome_with_stdout(stdout: &str) -> ProcessOutcome {
        ProcessOutcome {
            exit_code: 0,
            stdout: stdout.to_string(),
            stderr: String::new(),
            duration_ms: 1,
        }
    }

    #[tokio::test]
    async fn artifact_is_read_split_and_deleted() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("doc.pdf.txt");
        fs::write(&artifact, "alpha\nbravo\ncharlie\n").await.unwrap();

        let lines = extract(ScrapMode::Full, &artifact, &outcome_with_stdout(""))
            .await
            .unwrap();

        assert_eq!(lines, vec!["alpha", "bravo", "charlie"]);
        assert!(
            fs::metadata(&artifact).await.is_err(),
            "artifact must be deleted after reading"
        );
    }

    #[tokio::test]
    async fn metadata_falls_back_to_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("doc.pdf.txt");

        let lines = extract(
            ScrapMode::Metadata,
            &artifact,
            &outcome_with_stdout("Title: Test\nAuthor: Nobody"),
        )
        .await
        .unwrap();

        assert_eq!(lines, vec!["Title: Test", "Author: Nobody"]);
    }

    #[tokio::test]
    async fn artifact_wins_over_stdout_for_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("doc.pdf.txt");
        fs::write(&artifact, "From file").await.unwrap();

        let lines = extract(
            ScrapMode::Metadata,
            &artifact,
            &outcome_with_stdout("From stdout"),
        )
        .await
        .unwrap();

        assert_eq!(lines, vec!["From file"]);
    }

    #[tokio::test]
    async fn unreadable_artifact_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("doc.pdf.txt");
        // A directory at the artifact path exists but cannot be read as a file.
        fs::create_dir(&artifact).await.unwrap();

        let result = extract(ScrapMode::Full, &artifact, &outcome_with_stdout("")).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn no_artifact_and_non_metadata_mode_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("doc.pdf.txt");

        let lines = extract(
            ScrapMode::Entropy,
            &artifact,
            &outcome_with_stdout("ignored"),
        )
        .await
        .unwrap();

        assert!(lines.is_empty());
    }
}
