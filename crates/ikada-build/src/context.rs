use crate::error::{BuildError, BuildResult};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::path::Path;
use tar::Builder;

pub struct ContextBuilder;

impl ContextBuilder {
    /// ビルドコンテキストを tar.gz アーカイブとして作成
    ///
    /// ディレクトリ直下に `Dockerfile` があることを前提とする。
    pub fn create_context(context_path: &Path) -> BuildResult<Vec<u8>> {
        if !context_path.is_dir() {
            return Err(BuildError::ContextNotFound(context_path.to_path_buf()));
        }
        if !context_path.join("Dockerfile").is_file() {
            return Err(BuildError::DockerfileNotFound(context_path.to_path_buf()));
        }

        tracing::debug!("Creating build context from: {}", context_path.display());

        let mut archive_data = Vec::new();
        {
            let encoder = GzEncoder::new(&mut archive_data, Compression::default());
            let mut tar = Builder::new(encoder);

            // コンテキストディレクトリを再帰的に追加
            tar.append_dir_all(".", context_path)
                .map_err(BuildError::Io)?;
            tar.finish().map_err(BuildError::Io)?;
        }

        tracing::debug!("Build context created: {} bytes", archive_data.len());

        Self::check_context_size(archive_data.len());

        Ok(archive_data)
    }

    /// コンテキストサイズのチェックと警告
    fn check_context_size(size: usize) {
        const MAX_CONTEXT_SIZE: usize = 500 * 1024 * 1024; // 500MB

        if size > MAX_CONTEXT_SIZE {
            tracing::warn!(
                "ビルドコンテキストが大きすぎます（{}MB）。.dockerignore で不要なファイルの除外を推奨します。",
                size / 1024 / 1024
            );
        }
    }
}
