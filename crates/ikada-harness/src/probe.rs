use crate::error::Result;

/// テスト対象サービスへ HTTP GET を送り、レスポンスボディを返す
///
/// ステータスが 2xx 以外なら失敗。リトライはしない（healthy 待機が
/// 済んでいる前提で 1 回だけ叩く）。
pub async fn fetch_body(url: &str) -> Result<String> {
    tracing::debug!("HTTP プローブ: {}", url);
    let response = reqwest::get(url).await?.error_for_status()?;
    Ok(response.text().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;

    // 1 リクエストだけ返すミニマムな HTTP サーバ
    fn serve_once(body: &'static str) -> u16 {
        let listener = TcpListener::bind(("127.0.0.1", 0)).unwrap();
        let port = listener.local_addr().unwrap().port();
        std::thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 1024];
                let _ = stream.read(&mut buf);
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });
        port
    }

    #[tokio::test]
    async fn test_fetch_body_returns_response_text() {
        let port = serve_once("hello world\n");
        let body = fetch_body(&format!("http://127.0.0.1:{port}/file.txt"))
            .await
            .unwrap();
        assert!(body.contains("hello world"));
    }

    #[tokio::test]
    async fn test_fetch_body_fails_on_connection_refused() {
        // 誰も listen していないポート
        let port = crate::port::free_port().unwrap();
        let result = fetch_body(&format!("http://127.0.0.1:{port}/")).await;
        assert!(result.is_err());
    }
}
