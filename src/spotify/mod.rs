//! Spotify collaborators: OAuth token refresh and the now-playing fetch.

pub mod client;
pub mod token;

pub use client::{NowPlayingClient, NowPlayingSource};
pub use token::{Clock, SystemClock, TokenProvider};

#[cfg(test)]
pub(crate) mod testutil {
    //! Manual clock and a raw-TCP HTTP stub for exercising outbound clients.

    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
    use std::sync::Arc;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::Mutex;

    use super::Clock;

    /// Clock that only moves when told to.
    pub(crate) struct ManualClock {
        now: AtomicU64,
    }

    impl ManualClock {
        pub(crate) fn at(now: u64) -> Arc<Self> {
            Arc::new(Self {
                now: AtomicU64::new(now),
            })
        }

        pub(crate) fn advance(&self, secs: u64) {
            self.now.fetch_add(secs, Ordering::SeqCst);
        }
    }

    impl Clock for ManualClock {
        fn now_unix(&self) -> u64 {
            self.now.load(Ordering::SeqCst)
        }
    }

    /// Running HTTP stub with a hit counter and captured raw requests.
    pub(crate) struct Stub {
        pub(crate) base_url: String,
        hits: Arc<AtomicUsize>,
        pub(crate) requests: Arc<Mutex<Vec<String>>>,
    }

    impl Stub {
        pub(crate) fn hit_count(&self) -> usize {
            self.hits.load(Ordering::SeqCst)
        }
    }

    /// Spawns a stub that answers every connection with `status_line` and
    /// `body` until the test ends. Responses close the connection, so each
    /// request shows up as one hit.
    pub(crate) async fn spawn_stub(status_line: &'static str, body: &'static str) -> Stub {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let hits = Arc::new(AtomicUsize::new(0));
        let requests = Arc::new(Mutex::new(Vec::new()));
        let (hit_counter, request_log) = (hits.clone(), requests.clone());

        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    break;
                };
                hit_counter.fetch_add(1, Ordering::SeqCst);

                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                loop {
                    let Ok(n) = stream.read(&mut chunk).await else { break };
                    if n == 0 {
                        break;
                    }
                    buf.extend_from_slice(&chunk[..n]);
                    if request_complete(&buf) {
                        break;
                    }
                }
                request_log
                    .lock()
                    .await
                    .push(String::from_utf8_lossy(&buf).to_string());

                let response = if body.is_empty() {
                    format!("HTTP/1.1 {}\r\nConnection: close\r\n\r\n", status_line)
                } else {
                    format!(
                        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status_line,
                        body.len(),
                        body
                    )
                };
                let _ = stream.write_all(response.as_bytes()).await;
            }
        });

        Stub {
            base_url,
            hits,
            requests,
        }
    }

    /// True once the buffer holds full headers plus any declared body.
    fn request_complete(buf: &[u8]) -> bool {
        let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            return false;
        };
        let headers = String::from_utf8_lossy(&buf[..pos]);
        let content_length = headers
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                if name.eq_ignore_ascii_case("content-length") {
                    value.trim().parse::<usize>().ok()
                } else {
                    None
                }
            })
            .unwrap_or(0);
        buf.len() >= pos + 4 + content_length
    }
}
