use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error(
        "Dockerに接続できません: {0}\n\nヒント:\n  • Dockerが起動しているか確認してください\n  • OrbStackまたはDocker Desktopがインストールされているか確認してください"
    )]
    DockerConnectionFailed(String),

    #[error("コンテナ '{container}' が見つかりません")]
    ContainerNotFound { container: String },

    #[error(
        "コンテナ '{container}' のhealthy待機中にタイムアウトしました（{max_retries}回リトライ）\n\nヒント:\n  • ヘルスチェックコマンドがコンテナ内で実行可能か確認してください\n  • WaitConfigのmax_retriesを増やしてみてください"
    )]
    HealthWaitTimeout { container: String, max_retries: u32 },

    #[error("Docker APIエラー: {0}")]
    DockerApiError(String),

    #[error("HTTPプローブに失敗しました: {0}")]
    Probe(#[from] reqwest::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),
}

impl From<bollard::errors::Error> for HarnessError {
    fn from(err: bollard::errors::Error) -> Self {
        let err_str = err.to_string();
        if err_str.contains("Connection refused") || err_str.contains("No such file or directory")
        {
            HarnessError::DockerConnectionFailed(err_str)
        } else {
            HarnessError::DockerApiError(err_str)
        }
    }
}

pub type Result<T> = std::result::Result<T, HarnessError>;
