//! 架构相关操作的 Mock 实现

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// 中断使能位（与 RISC-V sstatus.SIE 相同）
pub const SIE_BIT: usize = 0x2;

/// Mock 架构操作（单 CPU）
pub struct MockArchOps {
    pub interrupt_state: AtomicBool,
    /// 关中断次数，用于确认临界区确实关闭过中断
    pub disable_count: AtomicUsize,
}

impl MockArchOps {
    pub const fn new() -> Self {
        Self {
            interrupt_state: AtomicBool::new(true),
            disable_count: AtomicUsize::new(0),
        }
    }

    /// 关闭中断，返回之前的 flags（启用时包含 [`SIE_BIT`]）
    ///
    /// # Safety
    /// 仅用于测试环境。
    pub unsafe fn read_and_disable_interrupts(&self) -> usize {
        self.disable_count.fetch_add(1, Ordering::Relaxed);
        if self.interrupt_state.swap(false, Ordering::SeqCst) {
            SIE_BIT
        } else {
            0
        }
    }

    /// 按 flags 恢复中断状态
    ///
    /// # Safety
    /// 仅用于测试环境。
    pub unsafe fn restore_interrupts(&self, flags: usize) {
        self.interrupt_state
            .store(flags & SIE_BIT != 0, Ordering::SeqCst);
    }

    pub fn sie_mask(&self) -> usize {
        SIE_BIT
    }

    pub fn interrupts_enabled(&self) -> bool {
        self.interrupt_state.load(Ordering::SeqCst)
    }

    pub fn disable_count(&self) -> usize {
        self.disable_count.load(Ordering::Relaxed)
    }
}

impl Default for MockArchOps {
    fn default() -> Self {
        Self::new()
    }
}

/// 全局 Mock 实例
pub static MOCK_ARCH_OPS: MockArchOps = MockArchOps::new();
