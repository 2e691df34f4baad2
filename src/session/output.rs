use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use tokio::{
    io::{AsyncRead, AsyncReadExt},
    sync::{Mutex, Notify},
    task::JoinHandle,
    time::Instant,
};

/// Output accumulated from a child's stdout and stderr.
#[derive(Debug)]
pub struct OutputBuffer {
    data: Mutex<Vec<u8>>,
    notify: Notify,
    open_streams: AtomicUsize,
}

impl OutputBuffer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            data: Mutex::new(Vec::new()),
            notify: Notify::new(),
            open_streams: AtomicUsize::new(0),
        })
    }

    async fn push(&self, bytes: &[u8]) {
        self.data.lock().await.extend_from_slice(bytes);
        self.notify.notify_one();
    }

    fn close_stream(&self) {
        self.open_streams.fetch_sub(1, Ordering::AcqRel);
        self.notify.notify_one();
    }

    /// True once every attached stream has reached EOF. A buffer with no
    /// attached streams counts as closed.
    pub fn is_closed(&self) -> bool {
        self.open_streams.load(Ordering::Acquire) == 0
    }

    /// Drain everything collected so far.
    pub async fn take(&self) -> String {
        let bytes = std::mem::take(&mut *self.data.lock().await);
        String::from_utf8_lossy(&bytes).into_owned()
    }

    async fn is_empty(&self) -> bool {
        self.data.lock().await.is_empty()
    }

    /// Wait for the child to answer.
    ///
    /// Waits up to `max_wait` for the first bytes, then until no new output
    /// has arrived for `quiet`. Returns early when all streams are closed.
    pub async fn settle(&self, quiet: Duration, max_wait: Duration) {
        let deadline = Instant::now() + max_wait;

        while self.is_empty().await && !self.is_closed() {
            if tokio::time::timeout_at(deadline, self.notify.notified())
                .await
                .is_err()
            {
                return;
            }
        }

        while !self.is_closed() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return;
            }
            if tokio::time::timeout(quiet.min(remaining), self.notify.notified())
                .await
                .is_err()
            {
                return;
            }
        }
    }
}

/// Copy `reader` into `buffer` until EOF.
pub fn spawn_reader<R>(mut reader: R, buffer: Arc<OutputBuffer>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    buffer.open_streams.fetch_add(1, Ordering::AcqRel);
    tokio::spawn(async move {
        let mut chunk = [0u8; 4096];
        loop {
            match reader.read(&mut chunk).await {
                Ok(0) => break,
                Ok(n) => buffer.push(&chunk[..n]).await,
                Err(err) => {
                    tracing::debug!("session output stream failed: {}", err);
                    break;
                }
            }
        }
        buffer.close_stream();
    })
}
