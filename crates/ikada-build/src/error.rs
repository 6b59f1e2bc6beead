use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Build context directory not found: {0}")]
    ContextNotFound(PathBuf),

    #[error("Dockerfile not found in build context: {0}")]
    DockerfileNotFound(PathBuf),

    #[error("Docker connection error: {0}")]
    Transport(#[from] bollard::errors::Error),

    #[error("Build failed: {0}")]
    BuildFailed(String),

    #[error("Build stream ended without an image id")]
    MissingImageId,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BuildError {
    /// ビルドストリーム側の失敗（エラーイベント）かどうか
    pub fn is_build_failure(&self) -> bool {
        matches!(self, BuildError::BuildFailed(_))
    }

    /// ID 未観測のままストリームが終了したかどうか
    ///
    /// トランスポート障害と違い、ビルド出力の形式が想定と異なるケース。
    /// 呼び出し側でリトライや診断の判断に使う。
    pub fn is_missing_id(&self) -> bool {
        matches!(self, BuildError::MissingImageId)
    }
}

pub type Result<T> = std::result::Result<T, BuildError>;
pub type BuildResult<T> = Result<T>;
