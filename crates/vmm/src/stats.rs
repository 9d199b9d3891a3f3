//! 计数器与时钟
//!
//! 计数器只用于观测；时钟的单调性决定 LRU 的结果。

use alloc::sync::Arc;
use core::sync::atomic::{AtomicU64, Ordering};

/// 子系统计数器快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VmStats {
    /// TLB 装入次数（每次插入计一次）
    pub tlb_misses: u64,
    /// 换入次数
    pub page_faults: u64,
    /// 实际发生写回的换出次数
    pub page_outs: u64,
}

/// 单调递增的时钟
pub trait TickSource: Send + Sync {
    /// 当前时刻
    fn now(&self) -> u64;
}

impl<T: TickSource + ?Sized> TickSource for Arc<T> {
    fn now(&self) -> u64 {
        (**self).now()
    }
}

/// 每次读取自增 1 的时钟
///
/// 每次 TLB 插入读取一次，因此不同插入得到的时刻严格递增。
#[derive(Debug, Default)]
pub struct StepClock {
    ticks: AtomicU64,
}

impl StepClock {
    /// 从 0 开始计数（第一次读取返回 1）
    pub const fn new() -> Self {
        Self {
            ticks: AtomicU64::new(0),
        }
    }
}

impl TickSource for StepClock {
    fn now(&self) -> u64 {
        self.ticks.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// 由调用者推进的时钟
#[derive(Debug, Default)]
pub struct ManualClock {
    ticks: AtomicU64,
}

impl ManualClock {
    /// 从 `start` 开始
    pub const fn new(start: u64) -> Self {
        Self {
            ticks: AtomicU64::new(start),
        }
    }

    /// 设置当前时刻
    pub fn set(&self, tick: u64) {
        self.ticks.store(tick, Ordering::Relaxed);
    }

    /// 向前推进 `delta`
    pub fn advance(&self, delta: u64) {
        self.ticks.fetch_add(delta, Ordering::Relaxed);
    }
}

impl TickSource for ManualClock {
    fn now(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }
}
