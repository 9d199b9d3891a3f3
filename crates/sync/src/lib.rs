//! 单处理器同步原语
//!
//! 虚拟内存子系统运行在单个逻辑处理器上，缺页处理必须相对其它线程原子地执行。
//! 在单处理器上，关闭中断即可保证这一点，因此本 crate 只提供两类原语：
//!
//! - [`IntrGuard`]：RAII 中断保护器，构造时关中断，析构时恢复
//! - [`IntrMutex`]：基于 `lock_api` 的互斥锁，持锁期间中断保持关闭
//!
//! # 架构依赖
//!
//! 中断的开关由 [`ArchOps`] 抽象，使用前必须调用 [`register_arch_ops`] 注册实现。

#![no_std]

mod intr_guard;
mod intr_mutex;
mod raw_intr_lock;

pub use intr_guard::*;
pub use intr_mutex::*;
pub use raw_intr_lock::RawIntrLock;

use core::sync::atomic::{AtomicUsize, Ordering};

/// 架构相关操作的 trait
///
/// 由内核实现并注册，提供本地中断控制
pub trait ArchOps: Send + Sync {
    /// 读取并禁用中断，返回之前的状态
    ///
    /// # Safety
    /// 调用者必须确保在适当的上下文中调用
    unsafe fn read_and_disable_interrupts(&self) -> usize;

    /// 恢复中断状态
    ///
    /// # Safety
    /// flags 必须是之前 read_and_disable_interrupts 返回的值
    unsafe fn restore_interrupts(&self, flags: usize);

    /// 中断使能位在 flags 中的掩码
    fn interrupt_enable_mask(&self) -> usize;
}

static ARCH_OPS_DATA: AtomicUsize = AtomicUsize::new(0);
static ARCH_OPS_VTABLE: AtomicUsize = AtomicUsize::new(0);

/// 注册架构操作实现
///
/// # Safety
/// 必须在单线程环境下调用；重复注册时后一次覆盖前一次
pub unsafe fn register_arch_ops(ops: &'static dyn ArchOps) {
    let ptr = ops as *const dyn ArchOps;
    // SAFETY: fat pointer 的布局是 (data, vtable)
    let (data, vtable) = unsafe { core::mem::transmute::<*const dyn ArchOps, (usize, usize)>(ptr) };
    ARCH_OPS_DATA.store(data, Ordering::Release);
    ARCH_OPS_VTABLE.store(vtable, Ordering::Release);
}

#[inline]
pub(crate) fn arch_ops() -> &'static dyn ArchOps {
    let data = ARCH_OPS_DATA.load(Ordering::Acquire);
    let vtable = ARCH_OPS_VTABLE.load(Ordering::Acquire);
    if data == 0 {
        panic!("sync: ArchOps not registered, call register_arch_ops first");
    }
    // SAFETY: data 和 vtable 由 register_arch_ops 写入，指向 'static 对象
    unsafe { &*core::mem::transmute::<(usize, usize), *const dyn ArchOps>((data, vtable)) }
}
