//! 全局内存管理器
//!
//! 内核只有一套 TLB 和一个物理帧池，需要单例时使用这里的接口；
//! 测试可以直接构造独立的 [`MemoryManager`]。

use crate::config::VmConfig;
use crate::error::{VmError, VmResult};
use crate::manager::{FaultAddress, FaultContext, MemoryManager, TlbFill};
use lazy_static::lazy_static;
use sync::IntrMutex;

lazy_static! {
    /// 全局内存管理器实例
    static ref VM_MANAGER: IntrMutex<Option<MemoryManager>> = IntrMutex::new(None);
}

/// 初始化全局内存管理器；重复调用会丢弃之前的状态
pub fn init_vm_manager(config: VmConfig) -> VmResult<()> {
    let manager = MemoryManager::new(config)?;
    *VM_MANAGER.lock() = Some(manager);
    log::debug!(
        "vmm: {} frames of {} bytes, {} TLB slots",
        config.num_phys_pages,
        config.page_size,
        config.tlb_size
    );
    Ok(())
}

/// 在持锁状态下访问全局内存管理器
///
/// 全局锁不可重入：闭包内不能再调用 [`with_vm_manager`] 或全局的
/// [`handle_tlb_miss`]，否则会永远自旋。闭包内请直接使用传入的 `&mut MemoryManager`。
pub fn with_vm_manager<R>(f: impl FnOnce(&mut MemoryManager) -> R) -> VmResult<R> {
    let mut guard = VM_MANAGER.lock();
    let manager = guard.as_mut().ok_or(VmError::NotInitialized)?;
    Ok(f(manager))
}

/// 由全局内存管理器处理一次 TLB 缺失
pub fn handle_tlb_miss(ctx: &FaultContext<'_>, fault: FaultAddress) -> VmResult<TlbFill> {
    with_vm_manager(|manager| manager.handle_tlb_miss(ctx, fault))?
}
