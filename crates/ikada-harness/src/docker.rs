use crate::error::{HarnessError, Result};
use bollard::Docker;

/// Docker接続を初期化
pub async fn init_docker() -> Result<Docker> {
    let docker = Docker::connect_with_local_defaults()
        .map_err(|e| HarnessError::DockerConnectionFailed(e.to_string()))?;

    // 接続テスト
    docker
        .ping()
        .await
        .map_err(|e| HarnessError::DockerConnectionFailed(e.to_string()))?;

    Ok(docker)
}
