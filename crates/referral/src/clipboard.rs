use crate::error::{ReferralError, Result};
use async_trait::async_trait;
use std::{
    process::Stdio,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use tokio::{io::AsyncWriteExt, process::Command, sync::Mutex};
use tracing::debug;

pub type DynClipboard = Arc<dyn Clipboard + Send + Sync>;

/// 只写的系统剪贴板
#[async_trait]
pub trait Clipboard {
    async fn write_text(&self, text: &str) -> Result<()>;
}

/// 内存剪贴板，记录最后一次复制的内容
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    contents: Mutex<Option<String>>,
    writes: Mutex<Vec<String>>,
    failing: AtomicBool,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// 之后的写入全部失败
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn contents(&self) -> Option<String> {
        self.contents.lock().await.clone()
    }

    pub async fn writes(&self) -> Vec<String> {
        self.writes.lock().await.clone()
    }
}

#[async_trait]
impl Clipboard for MemoryClipboard {
    async fn write_text(&self, text: &str) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ReferralError::Clipboard("clipboard unavailable".to_string()));
        }
        *self.contents.lock().await = Some(text.to_string());
        self.writes.lock().await.push(text.to_string());
        Ok(())
    }
}

/// 通过外部命令写入系统剪贴板
#[derive(Debug, Clone)]
pub struct CommandClipboard {
    program: String,
    args: Vec<String>,
}

impl CommandClipboard {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// 按平台选择复制命令
    pub fn detect() -> Self {
        if cfg!(target_os = "macos") {
            Self::new("pbcopy", vec![])
        } else if std::env::var_os("WAYLAND_DISPLAY").is_some() {
            Self::new("wl-copy", vec![])
        } else {
            Self::new("xclip", vec!["-selection".to_string(), "clipboard".to_string()])
        }
    }
}

#[async_trait]
impl Clipboard for CommandClipboard {
    async fn write_text(&self, text: &str) -> Result<()> {
        debug!("📋 调用剪贴板命令: {} {:?}", self.program, self.args);

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| ReferralError::Clipboard(format!("无法启动 {}: {}", self.program, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .await
                .map_err(|e| ReferralError::Clipboard(e.to_string()))?;
        }

        let status = child
            .wait()
            .await
            .map_err(|e| ReferralError::Clipboard(e.to_string()))?;

        if !status.success() {
            return Err(ReferralError::Clipboard(format!("{} 退出码 {}", self.program, status)));
        }

        Ok(())
    }
}
