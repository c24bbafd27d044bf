//! File system publisher implementation.

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader, BufWriter};
use tracing::{debug, info, warn};

use super::error::PublishError;
use super::types::{PublishedArtifact, PublishedSession};
use crate::config::StorageConfig;
use crate::metrics;
use crate::pipeline::SNAPSHOT_FILE;
use crate::session::{ArtifactKind, Session, SessionId};

/// Directory under `public_dir` holding one folder per published session.
pub const PUBLIC_SUBDIR: &str = "generated";

const BUFFER_SIZE: usize = 64 * 1024;

/// Name an artifact gets in the public tree.
pub fn public_file_name(kind: ArtifactKind, source: &Path) -> String {
    match kind {
        ArtifactKind::Mindmap => "mindmap.txt".to_string(),
        ArtifactKind::Audio => format!(
            "narration.{}",
            source.extension().and_then(|e| e.to_str()).unwrap_or("mp3")
        ),
        ArtifactKind::Video => "video.mp4".to_string(),
    }
}

pub struct Publisher {
    config: StorageConfig,
}

impl Publisher {
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    fn snapshot_path(&self, session_id: &SessionId) -> PathBuf {
        self.config
            .output_dir
            .join(session_id.as_str())
            .join(SNAPSHOT_FILE)
    }

    /// Destination directory for a session's public files.
    pub fn session_public_dir(&self, session_id: &SessionId) -> PathBuf {
        self.config
            .public_dir
            .join(PUBLIC_SUBDIR)
            .join(session_id.as_str())
    }

    pub fn url_for(&self, session_id: &SessionId, file_name: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.config.public_url_prefix.trim_end_matches('/'),
            PUBLIC_SUBDIR,
            session_id,
            file_name
        )
    }

    /// URLs of the session's ready artifacts that are already in the public tree.
    pub fn urls_for(&self, session: &Session) -> BTreeMap<ArtifactKind, String> {
        let public_dir = self.session_public_dir(&session.session_id);
        session
            .artifacts
            .iter()
            .filter_map(|(kind, entry)| {
                let record = entry.record()?;
                let name = public_file_name(*kind, &record.path);
                public_dir
                    .join(&name)
                    .exists()
                    .then(|| (*kind, self.url_for(&session.session_id, &name)))
            })
            .collect()
    }

    /// Reads the durable snapshot written when the session completed.
    pub async fn load_snapshot(&self, session_id: &SessionId) -> Result<Session, PublishError> {
        if !session_id.is_path_safe() {
            return Err(PublishError::NotFound(session_id.clone()));
        }
        let path = self.snapshot_path(session_id);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PublishError::NotFound(session_id.clone()))
            }
            Err(e) => return Err(PublishError::Io(e)),
        };

        serde_json::from_slice(&bytes).map_err(|e| PublishError::InvalidSnapshot {
            path,
            reason: e.to_string(),
        })
    }

    /// Copies every ready artifact of a completed session into the public tree.
    pub async fn publish(&self, session_id: &SessionId) -> Result<PublishedSession, PublishError> {
        let result = self.publish_session(session_id).await;
        let label = if result.is_ok() { "success" } else { "failed" };
        metrics::PUBLISH_TOTAL.with_label_values(&[label]).inc();
        result
    }

    async fn publish_session(
        &self,
        session_id: &SessionId,
    ) -> Result<PublishedSession, PublishError> {
        let session = self.load_snapshot(session_id).await?;
        let public_dir = self.session_public_dir(session_id);
        fs::create_dir_all(&public_dir).await?;

        let mut artifacts = BTreeMap::new();
        for (kind, entry) in &session.artifacts {
            let Some(record) = entry.record() else {
                debug!(session_id = %session_id, kind = %kind, "skipping failed artifact");
                continue;
            };
            if !fs::try_exists(&record.path).await.unwrap_or(false) {
                debug!(
                    session_id = %session_id,
                    kind = %kind,
                    path = %record.path.display(),
                    "skipping missing artifact"
                );
                continue;
            }

            let name = public_file_name(*kind, &record.path);
            let destination = public_dir.join(&name);
            let (size_bytes, checksum) = copy_file(&record.path, &destination).await?;

            artifacts.insert(
                *kind,
                PublishedArtifact {
                    url: self.url_for(session_id, &name),
                    path: destination,
                    size_bytes,
                    checksum,
                },
            );
        }

        info!(
            session_id = %session_id,
            artifacts = artifacts.len(),
            "session published"
        );

        Ok(PublishedSession {
            session_id: session_id.clone(),
            artifacts,
        })
    }
}

/// Copies `source` next to `destination` and renames it into place.
///
/// Returns the number of bytes copied and the SHA-256 of the content.
async fn copy_file(source: &Path, destination: &Path) -> Result<(u64, String), PublishError> {
    let file_name = destination
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    // Unique per call: overlapping publishes of one session must not share a temp file
    let temp_path = destination.with_file_name(format!(
        ".{}.{}.tmp",
        file_name,
        uuid::Uuid::new_v4().simple()
    ));

    let copy_err =
        |e: std::io::Error| PublishError::copy_failed(source.to_path_buf(), destination.to_path_buf(), e);

    let source_file = File::open(source).await.map_err(copy_err)?;
    let temp_file = File::create(&temp_path).await.map_err(copy_err)?;

    let mut reader = BufReader::with_capacity(BUFFER_SIZE, source_file);
    let mut writer = BufWriter::with_capacity(BUFFER_SIZE, temp_file);
    let mut hasher = Sha256::new();
    let mut total_bytes = 0u64;
    let mut buffer = vec![0u8; BUFFER_SIZE];

    let copied: Result<(), std::io::Error> = async {
        loop {
            let bytes_read = reader.read(&mut buffer).await?;
            if bytes_read == 0 {
                break;
            }
            hasher.update(&buffer[..bytes_read]);
            writer.write_all(&buffer[..bytes_read]).await?;
            total_bytes += bytes_read as u64;
        }
        writer.flush().await?;
        fs::rename(&temp_path, destination).await
    }
    .await;

    if let Err(e) = copied {
        if let Err(cleanup) = fs::remove_file(&temp_path).await {
            warn!(path = %temp_path.display(), error = %cleanup, "Failed to remove partial copy");
        }
        return Err(copy_err(e));
    }

    Ok((total_bytes, format!("{:x}", hasher.finalize())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{
        ArtifactEntry, ArtifactMetadata, ArtifactRecord, GenerationRequest,
    };
    use tempfile::TempDir;

    struct Fixture {
        _temp: TempDir,
        publisher: Publisher,
        output_dir: PathBuf,
        public_dir: PathBuf,
    }

    fn fixture() -> Fixture {
        let temp = TempDir::new().unwrap();
        let output_dir = temp.path().join("output");
        let public_dir = temp.path().join("public");
        let publisher = Publisher::new(StorageConfig {
            output_dir: output_dir.clone(),
            public_dir: public_dir.clone(),
            public_url_prefix: "/public/".to_string(),
        });
        Fixture {
            _temp: temp,
            publisher,
            output_dir,
            public_dir,
        }
    }

    fn ready(path: PathBuf, metadata: ArtifactMetadata) -> ArtifactEntry {
        let size_bytes = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        ArtifactEntry::Ready(ArtifactRecord {
            path,
            size_bytes,
            metadata,
        })
    }

    /// Writes artifacts plus a completed snapshot. The video entry is failed.
    fn completed_session(fx: &Fixture, id: &str) -> Session {
        let session_id = SessionId::from(id);
        let dir = fx.output_dir.join(id);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("mindmap.txt"), "mindmap\n  root((Tides))").unwrap();
        std::fs::write(dir.join("narration.mp3"), b"ID3 fake audio").unwrap();

        let mut session = Session::new(session_id, &GenerationRequest::new("tides"));
        session
            .attach_artifact(
                ArtifactKind::Mindmap,
                ready(
                    dir.join("mindmap.txt"),
                    ArtifactMetadata::Mindmap {
                        format: "mermaid".to_string(),
                        line_count: 2,
                    },
                ),
            )
            .unwrap();
        session
            .attach_artifact(
                ArtifactKind::Audio,
                ready(
                    dir.join("narration.mp3"),
                    ArtifactMetadata::Audio {
                        duration_secs: 3.0,
                        encoding: "MP3".to_string(),
                        segments: vec![],
                    },
                ),
            )
            .unwrap();
        session
            .attach_artifact(
                ArtifactKind::Video,
                ArtifactEntry::Failed {
                    error: "Render failed".to_string(),
                },
            )
            .unwrap();
        session.complete().unwrap();

        std::fs::write(
            dir.join(SNAPSHOT_FILE),
            serde_json::to_vec_pretty(&session).unwrap(),
        )
        .unwrap();
        session
    }

    #[tokio::test]
    async fn test_publish_unknown_session() {
        let fx = fixture();
        let err = fx
            .publisher
            .publish(&SessionId::from("missing"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_publish_copies_ready_artifacts() {
        let fx = fixture();
        completed_session(&fx, "s1");

        let published = fx.publisher.publish(&SessionId::from("s1")).await.unwrap();

        assert_eq!(published.artifacts.len(), 2);
        assert!(!published.artifacts.contains_key(&ArtifactKind::Video));
        assert_eq!(
            published.url(ArtifactKind::Mindmap),
            Some("/public/generated/s1/mindmap.txt")
        );
        assert_eq!(
            published.url(ArtifactKind::Audio),
            Some("/public/generated/s1/narration.mp3")
        );

        let audio = &published.artifacts[&ArtifactKind::Audio];
        assert_eq!(audio.path, fx.public_dir.join("generated/s1/narration.mp3"));
        assert_eq!(audio.size_bytes, 14);
        assert_eq!(
            audio.checksum,
            format!("{:x}", Sha256::digest(b"ID3 fake audio"))
        );
        assert_eq!(std::fs::read(&audio.path).unwrap(), b"ID3 fake audio");
    }

    #[tokio::test]
    async fn test_republish_is_idempotent() {
        let fx = fixture();
        completed_session(&fx, "s1");
        let id = SessionId::from("s1");

        let first = fx.publisher.publish(&id).await.unwrap();
        let second = fx.publisher.publish(&id).await.unwrap();
        assert_eq!(first, second);

        let entries: Vec<_> = std::fs::read_dir(fx.public_dir.join("generated/s1"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|name| !name.ends_with(".tmp")));
    }

    #[tokio::test]
    async fn test_missing_source_is_skipped() {
        let fx = fixture();
        completed_session(&fx, "s1");
        std::fs::remove_file(fx.output_dir.join("s1/mindmap.txt")).unwrap();

        let published = fx.publisher.publish(&SessionId::from("s1")).await.unwrap();
        assert_eq!(
            published.artifacts.keys().copied().collect::<Vec<_>>(),
            vec![ArtifactKind::Audio]
        );
    }

    #[tokio::test]
    async fn test_invalid_snapshot() {
        let fx = fixture();
        let dir = fx.output_dir.join("bad");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(SNAPSHOT_FILE), "{not json").unwrap();

        let err = fx
            .publisher
            .publish(&SessionId::from("bad"))
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::InvalidSnapshot { .. }));
    }

    #[tokio::test]
    async fn test_urls_for_only_lists_published_files() {
        let fx = fixture();
        let session = completed_session(&fx, "s1");
        assert!(fx.publisher.urls_for(&session).is_empty());

        fx.publisher.publish(&session.session_id).await.unwrap();
        let urls = fx.publisher.urls_for(&session);
        assert_eq!(urls.len(), 2);
        assert_eq!(urls[&ArtifactKind::Mindmap], "/public/generated/s1/mindmap.txt");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_overlapping_publishes_both_succeed() {
        let fx = fixture();
        completed_session(&fx, "s1");
        // Large enough that the two copies interleave
        let audio = vec![7u8; 8 * 1024 * 1024];
        std::fs::write(fx.output_dir.join("s1/narration.mp3"), &audio).unwrap();
        let id = SessionId::from("s1");

        for _ in 0..5 {
            let (first, second) =
                tokio::join!(fx.publisher.publish(&id), fx.publisher.publish(&id));
            let first = first.unwrap();
            let second = second.unwrap();
            assert_eq!(first.artifacts[&ArtifactKind::Audio].size_bytes, audio.len() as u64);
            assert_eq!(first, second);
        }

        let published = std::fs::read(fx.public_dir.join("generated/s1/narration.mp3")).unwrap();
        assert_eq!(published, audio);
        let leftovers = std::fs::read_dir(fx.public_dir.join("generated/s1"))
            .unwrap()
            .filter(|e| {
                e.as_ref()
                    .unwrap()
                    .file_name()
                    .to_string_lossy()
                    .ends_with(".tmp")
            })
            .count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn test_path_like_session_id_is_not_found() {
        let fx = fixture();
        completed_session(&fx, "s1");
        // A snapshot one level above the output tree must stay unreachable
        std::fs::copy(
            fx.output_dir.join("s1").join(SNAPSHOT_FILE),
            fx.output_dir.join(SNAPSHOT_FILE),
        )
        .unwrap();

        for id in ["..", ".", "", "s1/..", "../output/s1"] {
            let err = fx
                .publisher
                .publish(&SessionId::from(id))
                .await
                .unwrap_err();
            assert!(err.is_not_found(), "{:?} was not rejected", id);
        }
        assert!(!fx.public_dir.join(SNAPSHOT_FILE).exists());
    }

    #[test]
    fn test_public_file_name() {
        assert_eq!(
            public_file_name(ArtifactKind::Audio, Path::new("/x/narration.ogg")),
            "narration.ogg"
        );
        assert_eq!(
            public_file_name(ArtifactKind::Video, Path::new("/x/final_video.mp4")),
            "video.mp4"
        );
    }
}
