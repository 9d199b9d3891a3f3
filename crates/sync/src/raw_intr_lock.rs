//! 关中断原始锁
//!
//! 实现 `lock_api::RawMutex`：加锁时先关闭本地中断再置位锁标志，
//! 解锁时清除标志并恢复加锁前的中断状态。

use crate::arch_ops;
use core::{
    hint,
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};

/// 关中断原始锁。
///
/// 单处理器上持锁期间不会被中断抢占，因此锁标志只会在重入时冲突；
/// 宿主机测试中多个线程共享一把锁时会退化为自旋等待。
/// 不可重入。
#[derive(Debug)]
pub struct RawIntrLock {
    locked: AtomicBool,
    /// 加锁前的中断状态，解锁时恢复
    saved_flags: AtomicUsize,
}

impl RawIntrLock {
    /// 创建一个未加锁的实例。
    pub const fn new() -> Self {
        RawIntrLock {
            locked: AtomicBool::new(false),
            saved_flags: AtomicUsize::new(0),
        }
    }

    fn try_acquire(&self) -> bool {
        self.locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }
}

impl Default for RawIntrLock {
    fn default() -> Self {
        Self::new()
    }
}

// SAFETY: locked 标志保证同一时刻只有一个持有者
unsafe impl lock_api::RawMutex for RawIntrLock {
    #[allow(clippy::declare_interior_mutable_const)]
    const INIT: Self = RawIntrLock::new();

    // 保存的中断状态属于当前 CPU 上下文，guard 不能跨线程移动
    type GuardMarker = lock_api::GuardNoSend;

    fn lock(&self) {
        // SAFETY: 返回的 flags 在 unlock 中恢复
        let flags = unsafe { arch_ops().read_and_disable_interrupts() };
        while !self.try_acquire() {
            hint::spin_loop();
        }
        self.saved_flags.store(flags, Ordering::Relaxed);
    }

    fn try_lock(&self) -> bool {
        // SAFETY: 失败时立即恢复；成功时在 unlock 中恢复
        let flags = unsafe { arch_ops().read_and_disable_interrupts() };
        if self.try_acquire() {
            self.saved_flags.store(flags, Ordering::Relaxed);
            true
        } else {
            unsafe { arch_ops().restore_interrupts(flags) };
            false
        }
    }

    unsafe fn unlock(&self) {
        let flags = self.saved_flags.load(Ordering::Relaxed);
        self.locked.store(false, Ordering::Release);
        // SAFETY: flags 是加锁时保存的中断状态
        unsafe { arch_ops().restore_interrupts(flags) };
    }

    fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }
}
