//! 机器配置
//!
//! 描述被模拟机器的内存布局：页大小、物理帧数量与 TLB 容量。
//! 配置在创建 [`crate::MemoryManager`] 时显式传入，而不是从全局状态读取。

use crate::error::{VmError, VmResult};

/// 默认页大小（字节）
pub const DEFAULT_PAGE_SIZE: usize = 128;
/// 默认物理帧数量
pub const DEFAULT_NUM_PHYS_PAGES: usize = 32;
/// 默认 TLB 容量
pub const DEFAULT_TLB_SIZE: usize = 4;

/// 虚拟内存子系统的机器配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VmConfig {
    /// 页大小（字节），必须是 2 的幂
    pub page_size: usize,
    /// 物理帧数量
    pub num_phys_pages: usize,
    /// TLB 槽位数量
    pub tlb_size: usize,
}

impl VmConfig {
    /// 使用默认布局创建配置
    pub const fn new() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            num_phys_pages: DEFAULT_NUM_PHYS_PAGES,
            tlb_size: DEFAULT_TLB_SIZE,
        }
    }

    /// 设置页大小
    pub const fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// 设置物理帧数量
    pub const fn with_phys_pages(mut self, num_phys_pages: usize) -> Self {
        self.num_phys_pages = num_phys_pages;
        self
    }

    /// 设置 TLB 容量
    pub const fn with_tlb_size(mut self, tlb_size: usize) -> Self {
        self.tlb_size = tlb_size;
        self
    }

    /// 主存总字节数
    pub fn memory_size(&self) -> usize {
        self.page_size * self.num_phys_pages
    }

    /// 检查配置是否可用
    ///
    /// 至少一个物理帧保证了 LRU 总能选出牺牲帧，帧分配不会失败。
    pub fn validate(&self) -> VmResult<()> {
        if self.page_size == 0 || !self.page_size.is_power_of_two() {
            return Err(VmError::InvalidConfig("page size must be a power of two"));
        }
        if self.num_phys_pages == 0 {
            return Err(VmError::InvalidConfig("at least one physical frame is required"));
        }
        if self.tlb_size == 0 {
            return Err(VmError::InvalidConfig("at least one TLB slot is required"));
        }
        if self.page_size.checked_mul(self.num_phys_pages).is_none() {
            return Err(VmError::InvalidConfig("main memory size overflows"));
        }
        Ok(())
    }
}

impl Default for VmConfig {
    fn default() -> Self {
        Self::new()
    }
}
