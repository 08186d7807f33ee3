// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::fs;
use tokio::time::interval;
use tracing::{debug, info, warn};

/// 文件变更接收器
#[async_trait]
pub trait FileEventSink: Send + Sync {
    /// 被监视的文件被创建或修改时调用
    async fn on_file_changed(&self, path: &Path, content: &[u8]);
}

/// 把文件内容写入日志的接收器
#[derive(Debug, Clone)]
pub struct LoggingFileSink {
    max_chars: usize,
}

impl Default for LoggingFileSink {
    fn default() -> Self {
        Self { max_chars: 500 }
    }
}

#[async_trait]
impl FileEventSink for LoggingFileSink {
    async fn on_file_changed(&self, path: &Path, content: &[u8]) {
        let text = String::from_utf8_lossy(content);
        info!(
            path = %path.display(),
            contents = %truncate_text(&text, self.max_chars),
            "Handling change"
        );
    }
}

/// 截断过长的文本
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// 响应目录监视器
///
/// 轮询目录中的单个文件，文件出现或修改时间变化时通知接收器
pub struct ResponseWatcher {
    directory: PathBuf,
    filename: String,
    poll_interval: Duration,
    sink: Arc<dyn FileEventSink>,
    last_seen: Option<SystemTime>,
}

impl ResponseWatcher {
    pub fn new(
        directory: impl Into<PathBuf>,
        filename: impl Into<String>,
        poll_interval: Duration,
        sink: Arc<dyn FileEventSink>,
    ) -> Self {
        Self {
            directory: directory.into(),
            filename: filename.into(),
            poll_interval,
            sink,
            last_seen: None,
        }
    }

    /// 被监视文件的完整路径
    pub fn target(&self) -> PathBuf {
        self.directory.join(&self.filename)
    }

    /// 确保监视目录存在
    pub async fn ensure_directory(&self) -> io::Result<()> {
        if !fs::try_exists(&self.directory).await? {
            fs::create_dir_all(&self.directory).await?;
            info!(directory = %self.directory.display(), "Created directory");
        }
        Ok(())
    }

    /// 检查一次文件，返回是否触发了通知
    pub async fn poll_once(&mut self) -> io::Result<bool> {
        let target = self.target();

        let modified = match fs::metadata(&target).await {
            Ok(meta) if meta.is_file() => meta.modified()?,
            Ok(_) => return Ok(false),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e),
        };

        if self.last_seen == Some(modified) {
            return Ok(false);
        }
        self.last_seen = Some(modified);

        info!(file = %self.filename, "File has been modified.");
        let content = fs::read(&target).await?;
        self.sink.on_file_changed(&target, &content).await;
        Ok(true)
    }

    /// 持续监视直到 `shutdown` 完成
    pub async fn run<F>(mut self, shutdown: F) -> io::Result<()>
    where
        F: Future<Output = ()>,
    {
        self.ensure_directory().await?;
        info!(
            target = %self.target().display(),
            interval_ms = self.poll_interval.as_millis() as u64,
            "Watching for changes"
        );

        let mut ticker = interval(self.poll_interval);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    debug!("Watcher stopped");
                    return Ok(());
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.poll_once().await {
                        warn!(error = %e, "Failed to check watched file");
                    }
                }
            }
        }
    }
}
