//! 🌉 jbx — a bridge from schema-less JSON records to strongly-typed trees,
//! ready for bulk indexing into Elasticsearch.
//!
//! Prepare the job once, then push every record through decode → convert → write.
//! That's the whole bridge. The trolls under it are malformed JSON. 🦆

pub mod app_config;
pub mod artifacts;
pub mod backends;
pub mod common;
pub mod destination;
pub mod emitter;
pub mod errors;
pub mod job;
pub mod job_context;
pub mod transforms;

use anyhow::{Context, Result};
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::app_config::AppConfig;
use crate::backends::{LocalFsStore, NdjsonFileWriter, RecordWriter};
use crate::emitter::{EmitStats, RawRecord, RecordEmitter};
use crate::job_context::JobContext;

/// 🚀 Run one job end to end: prepare, then stream the input file through the emitter.
///
/// Each input line is one record. Blank lines are null payloads and get skipped.
/// Malformed lines (invalid UTF-8 included) are forwarded empty and logged.
/// Only structural failures stop the run.
pub async fn run(app_config: AppConfig) -> Result<EmitStats> {
    let store = LocalFsStore::new(&app_config.runtime.store_root);
    let mut job_context = JobContext::new();
    job::prepare(&app_config.location, &app_config.store, &mut job_context, &store)
        .await
        .context("💀 Could not prepare the job. Nothing was indexed, nothing was harmed.")?;

    let writer = NdjsonFileWriter::for_job(&app_config.runtime.output_file, &job_context).await?;
    let emitter = RecordEmitter::new(&job_context, writer)?;

    let input = File::open(&app_config.runtime.input_file).await.with_context(|| {
        format!(
            "💀 Input file '{}' could not be opened. The records are out there. Somewhere.",
            app_config.runtime.input_file.display()
        )
    })?;

    let destination = emitter.destination().clone();
    let stats = pump_records(BufReader::new(input), emitter).await?;
    info!(
        "✅ {destination}: {} forwarded, {} degraded, {} skipped",
        stats.forwarded, stats.degraded, stats.skipped
    );
    Ok(stats)
}

/// 🚰 Push every line of `reader` through `emitter`, then close it.
///
/// The writer gets closed (and flushed) even when a read or an emit fails
/// partway through, so whatever made it out before the failure is on disk.
/// The first error is the one returned; a close failure after it is only logged.
pub async fn pump_records<R, W>(reader: R, mut emitter: RecordEmitter<W>) -> Result<EmitStats>
where
    R: AsyncBufRead + Unpin,
    W: RecordWriter,
{
    match pump_lines(reader, &mut emitter).await {
        Ok(()) => Ok(emitter.close().await?),
        Err(err) => {
            if let Err(close_err) = emitter.close().await {
                warn!("⚠️ writer would not close after an earlier failure either: {close_err}");
            }
            Err(err)
        }
    }
}

async fn pump_lines<R, W>(mut reader: R, emitter: &mut RecordEmitter<W>) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: RecordWriter,
{
    let mut line = Vec::new();
    loop {
        line.clear();
        let read = reader
            .read_until(b'\n', &mut line)
            .await
            .context("💀 Failed to read an input line")?;
        if read == 0 {
            return Ok(());
        }
        emitter.emit(&record_from_line(&line)).await?;
    }
}

// 🧾 Line terminator off, whitespace-only means null. Bytes stay bytes.
fn record_from_line(line: &[u8]) -> RawRecord {
    let payload = line.strip_suffix(b"\n").unwrap_or(line);
    let payload = payload.strip_suffix(b"\r").unwrap_or(payload);
    if payload.iter().all(u8::is_ascii_whitespace) {
        RawRecord::null()
    } else {
        RawRecord::from_payload(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_config::RuntimeConfig;
    use crate::backends::InMemoryWriter;
    use crate::common::{NullKey, TypedNode};
    use crate::errors::JobError;
    use crate::job::StoreOptions;
    use async_trait::async_trait;
    use std::fs;

    struct Scene {
        _dir: tempfile::TempDir,
        config: AppConfig,
    }

    fn set_the_scene(location: &str, input: impl AsRef<[u8]>) -> Result<Scene> {
        let dir = tempfile::tempdir()?;
        let es_config = dir.path().join("elasticsearch.yml");
        fs::write(&es_config, "cluster.name: towel\n")?;
        let es_plugins = dir.path().join("plugins");
        fs::create_dir_all(&es_plugins)?;
        let input_file = dir.path().join("in.ndjson");
        fs::write(&input_file, input)?;

        let config = AppConfig {
            location: location.to_string(),
            store: StoreOptions {
                bulk_size: 2,
                es_config,
                es_plugins,
                ..StoreOptions::default()
            },
            runtime: RuntimeConfig {
                input_file,
                output_file: dir.path().join("out.ndjson"),
                store_root: dir.path().join("store"),
            },
        };
        Ok(Scene { _dir: dir, config })
    }

    #[tokio::test]
    async fn the_one_where_a_whole_batch_crosses_the_bridge() -> Result<()> {
        let scene = set_the_scene(
            "es://tweets/tweet",
            "{\"a\":\"x\",\"b\":5}\n\n{not json\n{\"tags\":[]}\n",
        )?;

        let stats = run(scene.config.clone()).await?;
        assert_eq!(stats, EmitStats { forwarded: 2, degraded: 1, skipped: 1 });

        let output = fs::read_to_string(&scene.config.runtime.output_file)?;
        let lines: Vec<serde_json::Value> = output
            .lines()
            .map(serde_json::from_str)
            .collect::<Result<_, _>>()?;
        assert_eq!(
            lines,
            vec![
                serde_json::json!({"a": "x", "b": 5}),
                serde_json::json!({}),
                serde_json::json!({"tags": null}),
            ]
        );

        // 🗄️ artifacts really landed in the store
        let store = LocalFsStore::new(&scene.config.runtime.store_root);
        assert!(store.local_path_of(artifacts::ES_CONFIG_REMOTE_PATH).exists());
        assert!(store.local_path_of(artifacts::ES_PLUGINS_REMOTE_PATH).is_dir());
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_a_bad_destination_stops_everything_before_it_starts() -> Result<()> {
        let scene = set_the_scene("es://no-type-here", "{}\n")?;
        let err = run(scene.config.clone()).await.unwrap_err();
        assert!(
            matches!(err.downcast_ref::<JobError>(), Some(JobError::InvalidDestination { .. })),
            "got: {err:#}"
        );
        assert!(!scene.config.runtime.output_file.exists(), "nothing should be written");
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_missing_plugins_abort_the_job() -> Result<()> {
        let mut scene = set_the_scene("es://tweets/tweet", "{}\n")?;
        scene.config.store.es_plugins = scene.config.store.es_plugins.join("gone");
        let err = run(scene.config.clone()).await.unwrap_err();
        assert!(
            matches!(err.downcast_ref::<JobError>(), Some(JobError::PreparationFailure { .. })),
            "got: {err:#}"
        );
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_a_line_of_garbage_bytes_is_just_one_degraded_record() -> Result<()> {
        let scene = set_the_scene("es://tweets/tweet", b"{\"a\":1}\n{\"b\":\"\xff\xfe\"}\r\n{\"c\":3}\n")?;

        let stats = run(scene.config.clone()).await?;
        assert_eq!(stats, EmitStats { forwarded: 2, degraded: 1, skipped: 0 });

        let output = fs::read_to_string(&scene.config.runtime.output_file)?;
        let lines: Vec<serde_json::Value> = output
            .lines()
            .map(serde_json::from_str)
            .collect::<Result<_, _>>()?;
        assert_eq!(
            lines,
            vec![
                serde_json::json!({"a": 1}),
                serde_json::json!({}),
                serde_json::json!({"c": 3}),
            ]
        );
        Ok(())
    }

    /// 🎲 Writes fine until it doesn't. Keeps the real writer inside so we can check it got closed.
    #[derive(Debug)]
    struct GivesUpOnSecondWrite {
        inner: InMemoryWriter,
        writes: usize,
    }

    #[async_trait]
    impl RecordWriter for GivesUpOnSecondWrite {
        async fn write(&mut self, key: NullKey, record: TypedNode) -> Result<()> {
            self.writes += 1;
            if self.writes == 2 {
                anyhow::bail!("disk full, feelings hurt");
            }
            self.inner.write(key, record).await
        }

        async fn close(&mut self) -> Result<()> {
            self.inner.close().await
        }
    }

    #[tokio::test]
    async fn the_one_where_a_writer_failure_still_closes_the_writer() -> Result<()> {
        let scene = set_the_scene("es://tweets/tweet", "")?;
        let mut job_context = JobContext::new();
        let store = LocalFsStore::new(&scene.config.runtime.store_root);
        job::prepare(&scene.config.location, &scene.config.store, &mut job_context, &store).await?;

        let witness = InMemoryWriter::new();
        let writer = GivesUpOnSecondWrite { inner: witness.clone(), writes: 0 };
        let emitter = RecordEmitter::new(&job_context, writer)?;

        let err = pump_records(&b"{}\n{}\n{}\n"[..], emitter).await.unwrap_err();
        assert!(
            matches!(err.downcast_ref::<JobError>(), Some(JobError::EmissionFailure { .. })),
            "got: {err:#}"
        );
        assert!(witness.is_closed().await, "the writer should be closed on the way out");
        assert_eq!(witness.records().await, vec![TypedNode::empty_map()]);
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_the_file_writer_flushes_what_it_had_before_the_failure() -> Result<()> {
        let scene = set_the_scene("es://tweets/tweet", "")?;
        let mut job_context = JobContext::new();
        let store = LocalFsStore::new(&scene.config.runtime.store_root);
        job::prepare(&scene.config.location, &scene.config.store, &mut job_context, &store).await?;

        // 📖 A reader that dies after one good line
        let input = tokio::io::AsyncReadExt::chain(&b"{\"a\":1}\n"[..], FailingReader);
        let writer = NdjsonFileWriter::new(&scene.config.runtime.output_file, 1000).await?;
        let emitter = RecordEmitter::new(&job_context, writer)?;

        assert!(pump_records(BufReader::new(input), emitter).await.is_err());
        let output = fs::read_to_string(&scene.config.runtime.output_file)?;
        assert_eq!(output.lines().count(), 1, "the good line should be flushed, got {output:?}");
        Ok(())
    }

    struct FailingReader;

    impl tokio::io::AsyncRead for FailingReader {
        fn poll_read(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
            _buf: &mut tokio::io::ReadBuf<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Err(std::io::Error::other("the tape snapped")))
        }
    }
}
