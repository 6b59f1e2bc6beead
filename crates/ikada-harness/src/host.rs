use tokio::net::lookup_host;

/// コンテナへホスト側から到達するためのアドレスを解決する
///
/// Docker Desktop (mac) では `docker.for.mac.localhost` が解決できる場合が
/// あり、その場合はそのアドレスを使う。解決できなければ `localhost` に
/// フォールバックする（CI でもローカルでも同じだが、ログで区別できるように
/// している）。
pub async fn docker_host_address() -> String {
    match lookup_host(("docker.for.mac.localhost", 0)).await {
        Ok(mut addrs) => {
            if let Some(addr) = addrs.next() {
                let ip = addr.ip().to_string();
                tracing::info!(
                    "docker.for.mac.localhost が解決できたため {} を使用します",
                    ip
                );
                return ip;
            }
            fallback_address()
        }
        Err(_) => fallback_address(),
    }
}

fn fallback_address() -> String {
    if std::env::var_os("CI").is_some() {
        tracing::debug!("CI 環境: localhost を使用します");
    } else {
        tracing::debug!("ローカル環境: localhost を使用します");
    }
    "localhost".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_docker_host_address_resolves_to_something_usable() {
        let addr = docker_host_address().await;
        // localhost か解決済み IP のどちらか
        assert!(!addr.is_empty());
    }
}
