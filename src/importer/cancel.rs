// ==========================================
// 会员组织管理系统 - 导入取消令牌
// ==========================================
// 调用方持有克隆并在任意线程调用 cancel()
// 导入流程在处理每一行之前检查；取消后不写入任何数据
// ==========================================

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct ImportCancelToken {
    cancelled: Arc<AtomicBool>,
}

impl ImportCancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}
