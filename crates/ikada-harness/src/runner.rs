//! テスト対象コンテナの作成・起動・破棄

// Bollard 0.19.4 の非推奨APIを一時的に使用
#![allow(deprecated)]

use crate::error::Result;
use bollard::Docker;
use bollard::container::{Config, CreateContainerOptions};
use bollard::models::{HealthConfig, HostConfig, PortBinding};
use std::collections::HashMap;
use std::time::Duration;

/// ヘルスチェック付きで起動するテスト対象サービスの定義
#[derive(Debug, Clone)]
pub struct ServiceSpec {
    pub container_name: String,
    pub image: String,
    /// コンテナ内でサービスが listen するポート
    pub container_port: u16,
    /// ホスト側にバインドするポート
    pub host_port: u16,
    /// CMD-SHELL で実行されるヘルスチェックコマンド
    pub health_cmd: String,
    pub health_interval: Duration,
    pub health_timeout: Duration,
    pub health_retries: i64,
    pub health_start_period: Duration,
}

impl ServiceSpec {
    pub fn new(
        container_name: impl Into<String>,
        image: impl Into<String>,
        container_port: u16,
        host_port: u16,
    ) -> Self {
        Self {
            container_name: container_name.into(),
            image: image.into(),
            container_port,
            host_port,
            health_cmd: format!(
                "curl --silent --fail http://localhost:{}/ || exit 1",
                container_port
            ),
            health_interval: Duration::from_secs(1),
            health_timeout: Duration::from_secs(1),
            health_retries: 12,
            health_start_period: Duration::from_secs(1),
        }
    }

    pub fn with_health_cmd(mut self, cmd: impl Into<String>) -> Self {
        self.health_cmd = cmd.into();
        self
    }
}

fn nanos(d: Duration) -> i64 {
    i64::try_from(d.as_nanos()).unwrap_or(i64::MAX)
}

/// ServiceSpec を Docker のコンテナ設定に変換
pub fn spec_to_container_config(
    spec: &ServiceSpec,
) -> (Config<String>, CreateContainerOptions<String>) {
    let container_port = format!("{}/tcp", spec.container_port);

    // ポート公開設定
    let mut exposed_ports = HashMap::new();
    exposed_ports.insert(container_port.clone(), HashMap::new());

    // ホストポートバインディング
    let mut port_bindings = HashMap::new();
    port_bindings.insert(
        container_port,
        Some(vec![PortBinding {
            host_ip: Some("0.0.0.0".to_string()),
            host_port: Some(spec.host_port.to_string()),
        }]),
    );

    let healthcheck = HealthConfig {
        test: Some(vec!["CMD-SHELL".to_string(), spec.health_cmd.clone()]),
        interval: Some(nanos(spec.health_interval)),
        timeout: Some(nanos(spec.health_timeout)),
        retries: Some(spec.health_retries),
        start_period: Some(nanos(spec.health_start_period)),
        ..Default::default()
    };

    let host_config = Some(HostConfig {
        port_bindings: Some(port_bindings),
        ..Default::default()
    });

    let config = Config {
        image: Some(spec.image.clone()),
        exposed_ports: Some(exposed_ports),
        healthcheck: Some(healthcheck),
        tty: Some(true),
        host_config,
        ..Default::default()
    };

    let options = CreateContainerOptions {
        name: spec.container_name.clone(),
        platform: None,
    };

    (config, options)
}

/// 起動済みテストコンテナのハンドル
///
/// テスト終了時は [`teardown`](Self::teardown) で明示的に破棄する。
pub struct TestContainer {
    docker: Docker,
    name: String,
}

impl TestContainer {
    /// コンテナを作成して起動する
    ///
    /// 前回のテストの残骸が同名で残っている場合は先に削除する。
    pub async fn start(docker: &Docker, spec: &ServiceSpec) -> Result<Self> {
        let (config, options) = spec_to_container_config(spec);

        if let Err(e) = docker
            .remove_container(
                &spec.container_name,
                Some(bollard::query_parameters::RemoveContainerOptions {
                    force: true,
                    ..Default::default()
                }),
            )
            .await
        {
            tracing::debug!("既存コンテナの削除をスキップ: {}", e);
        }

        docker.create_container(Some(options), config).await?;
        tracing::info!("コンテナ作成: {}", spec.container_name);

        docker
            .start_container(
                &spec.container_name,
                None::<bollard::query_parameters::StartContainerOptions>,
            )
            .await?;
        tracing::info!("コンテナ起動: {}", spec.container_name);

        Ok(Self {
            docker: docker.clone(),
            name: spec.container_name.clone(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// コンテナを停止して削除する
    pub async fn teardown(self) -> Result<()> {
        // 停止済みでも削除は続行する
        if let Err(e) = self
            .docker
            .stop_container(
                &self.name,
                None::<bollard::query_parameters::StopContainerOptions>,
            )
            .await
        {
            tracing::debug!("コンテナ停止をスキップ: {}", e);
        }

        self.docker
            .remove_container(
                &self.name,
                Some(bollard::query_parameters::RemoveContainerOptions {
                    force: true,
                    ..Default::default()
                }),
            )
            .await?;
        tracing::info!("コンテナ削除: {}", self.name);
        Ok(())
    }
}
