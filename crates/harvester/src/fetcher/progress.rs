//! Fetch-progress persistence.
//!
//! A dedicated task owns `<clone_dir>/last_fetched_id` and is the file's
//! sole writer. Workers emit the row id of each fully processed
//! repository; the writer overwrites the file in place with the id as a
//! 20-digit zero-padded decimal (the largest u64 fits in 20 digits). On
//! startup the supervisor reads the file back to bound the first cycle's
//! enumeration.

use std::io::SeekFrom;
use std::path::Path;

use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Name of the progress file under the clone root.
pub const LAST_FETCHED_ID_FILE: &str = "last_fetched_id";

/// Buffer size of the progress-id channel.
pub const ID_CHANNEL_BUFFER_SIZE: usize = 64;

/// Read the resume id persisted by a previous run.
///
/// An absent, empty or unparseable file degrades to 0 with a warning; the
/// fetcher then starts from the beginning.
pub fn read_resume_id(clone_dir: &Path) -> u64 {
    let path = clone_dir.join(LAST_FETCHED_ID_FILE);

    let contents = match std::fs::read_to_string(&path) {
        Ok(contents) if !contents.is_empty() => contents,
        _ => {
            tracing::warn!("cannot get last fetched repository id, starting from 0");
            return 0;
        }
    };

    match contents.trim().parse::<u64>() {
        Ok(id) => id,
        Err(_) => {
            tracing::warn!(
                contents = contents.trim(),
                "cannot convert last fetched id, starting from 0"
            );
            0
        }
    }
}

/// Spawn the progress writer task.
///
/// The task drains `rx` until the channel closes or `cancel` fires, then
/// flushes and closes the file. Opening the file is fatal to the caller:
/// without it no progress survives a restart.
pub async fn spawn_writer(
    clone_dir: &Path,
    rx: mpsc::Receiver<u64>,
    cancel: CancellationToken,
) -> std::io::Result<JoinHandle<()>> {
    let path = clone_dir.join(LAST_FETCHED_ID_FILE);
    let file = tokio::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&path)
        .await?;

    Ok(tokio::spawn(write_loop(file, rx, cancel)))
}

async fn write_loop(
    mut file: tokio::fs::File,
    mut rx: mpsc::Receiver<u64>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            id = rx.recv() => match id {
                Some(id) => write_id(&mut file, id).await,
                None => break,
            },
        }
    }

    if let Err(err) = file.sync_all().await {
        tracing::warn!(error = %err, "cannot sync progress file");
    }
}

async fn write_id(file: &mut tokio::fs::File, id: u64) {
    if let Err(err) = file.seek(SeekFrom::Start(0)).await {
        tracing::warn!(id, error = %err, "could not write id to progress file");
        return;
    }

    if let Err(err) = file.write_all(format!("{id:020}").as_bytes()).await {
        tracing::warn!(id, error = %err, "could not write id to progress file");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_file_resumes_from_zero() {
        let tmp = tempfile::tempdir().expect("tempdir");
        assert_eq!(read_resume_id(tmp.path()), 0);
    }

    #[test]
    fn empty_file_resumes_from_zero() {
        let tmp = tempfile::tempdir().expect("tempdir");
        std::fs::write(tmp.path().join(LAST_FETCHED_ID_FILE), "").expect("write");
        assert_eq!(read_resume_id(tmp.path()), 0);
    }

    #[test]
    fn unparseable_file_resumes_from_zero() {
        let tmp = tempfile::tempdir().expect("tempdir");
        std::fs::write(tmp.path().join(LAST_FETCHED_ID_FILE), "not-a-number").expect("write");
        assert_eq!(read_resume_id(tmp.path()), 0);
    }

    #[test]
    fn padded_id_parses_back() {
        let tmp = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            tmp.path().join(LAST_FETCHED_ID_FILE),
            "00000000000000001234",
        )
        .expect("write");
        assert_eq!(read_resume_id(tmp.path()), 1234);
    }

    #[tokio::test]
    async fn writer_overwrites_in_place() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let (tx, rx) = mpsc::channel(ID_CHANNEL_BUFFER_SIZE);
        let cancel = CancellationToken::new();

        let handle = spawn_writer(tmp.path(), rx, cancel)
            .await
            .expect("spawn writer");

        tx.send(1234).await.expect("send");
        tx.send(42).await.expect("send");
        drop(tx);
        handle.await.expect("writer task");

        let contents =
            std::fs::read_to_string(tmp.path().join(LAST_FETCHED_ID_FILE)).expect("read");
        assert_eq!(contents, "00000000000000000042");
        assert_eq!(contents.len(), 20);
        assert_eq!(read_resume_id(tmp.path()), 42);
    }

    #[tokio::test]
    async fn writer_flushes_on_cancellation() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let (tx, rx) = mpsc::channel(ID_CHANNEL_BUFFER_SIZE);
        let cancel = CancellationToken::new();

        let handle = spawn_writer(tmp.path(), rx, cancel.clone())
            .await
            .expect("spawn writer");

        tx.send(7).await.expect("send");
        // Give the writer a chance to drain before cancelling.
        tokio::task::yield_now().await;
        cancel.cancel();
        handle.await.expect("writer task");

        assert_eq!(read_resume_id(tmp.path()), 7);
    }
}
