//! コンテナの healthy 待機（Exponential Backoff）
//!
//! ヘルスチェックの実行スケジュールは Docker エンジン側が持つため、
//! こちらは inspect の結果を backoff 付きでポーリングするだけ。

use crate::error::{HarnessError, Result};
use bollard::Docker;
use bollard::models::HealthStatusEnum;
use std::time::Duration;
use tokio::time::sleep;

/// 待機設定（exponential backoff）
#[derive(Debug, Clone)]
pub struct WaitConfig {
    /// 最大リトライ回数
    pub max_retries: u32,
    /// 初期待機時間（ミリ秒）
    pub initial_delay_ms: u64,
    /// 最大待機時間（ミリ秒）
    pub max_delay_ms: u64,
    /// Exponential倍率
    pub multiplier: f64,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            max_retries: 23,
            initial_delay_ms: 500,
            max_delay_ms: 5000,
            multiplier: 2.0,
        }
    }
}

impl WaitConfig {
    pub fn delay_for_attempt(&self, attempt: u32) -> u64 {
        let delay = self.initial_delay_ms as f64 * self.multiplier.powi(attempt as i32);
        (delay as u64).min(self.max_delay_ms)
    }
}

/// コンテナが healthy になるまで待機
///
/// リトライ回数を使い切ったら [`HarnessError::HealthWaitTimeout`] で失敗する。
pub async fn wait_for_healthy(
    docker: &Docker,
    container_name: &str,
    config: &WaitConfig,
) -> Result<()> {
    for attempt in 0..config.max_retries {
        match check_container_healthy(docker, container_name).await {
            Ok(true) => {
                tracing::info!("コンテナ {} が healthy になりました", container_name);
                return Ok(());
            }
            Ok(false) => {
                // コンテナは存在するが、まだ healthy ではない
            }
            Err(e) => {
                tracing::debug!("inspect 失敗（リトライします）: {}", e);
            }
        }

        // 最後の試行でなければ待機
        if attempt + 1 < config.max_retries {
            let delay_ms = config.delay_for_attempt(attempt);
            sleep(Duration::from_millis(delay_ms)).await;
        }
    }

    Err(HarnessError::HealthWaitTimeout {
        container: container_name.to_string(),
        max_retries: config.max_retries,
    })
}

/// コンテナのヘルス状態を確認
async fn check_container_healthy(docker: &Docker, container_name: &str) -> Result<bool> {
    let inspect_result = docker
        .inspect_container(
            container_name,
            None::<bollard::query_parameters::InspectContainerOptions>,
        )
        .await
        .map_err(|e| HarnessError::DockerApiError(e.to_string()))?;

    let state = inspect_result
        .state
        .ok_or_else(|| HarnessError::ContainerNotFound {
            container: container_name.to_string(),
        })?;

    if !state.running.unwrap_or(false) {
        return Ok(false);
    }

    // ヘルスチェックが設定されている場合はそのステータスを見る
    if let Some(health) = state.health {
        if let Some(status) = health.status {
            return Ok(status == HealthStatusEnum::HEALTHY);
        }
    }

    // ヘルスチェックがない場合は Running で準備完了とみなす
    Ok(true)
}
