//! 虚拟内存子系统
//!
//! 处理软件管理 TLB 的缺失：倒排页表查找、按需换页（交换区或 mmap 文件）、
//! 物理帧的 LRU 替换与 TLB 槽位的 FIFO 替换。
//!
//! # 架构解耦
//!
//! - 中断开关通过 [`sync::register_arch_ops`] 注册，缺页处理期间关闭中断
//! - 交换区与被映射文件通过 [`BackingStore`] 读写
//! - 当前进程与地址空间通过 [`FaultContext`] 显式传入
//!
//! # 使用
//!
//! ```ignore
//! let mut mm = MemoryManager::new(VmConfig::default())?;
//! let space = Arc::new(AddressSpace::new(16, swap));
//! let ctx = FaultContext::new(Pid(1), &space);
//! mm.handle_tlb_miss(&ctx, FaultAddress::User)?;
//! ```

#![no_std]

extern crate alloc;

#[cfg(test)]
extern crate std;

mod backing;
mod config;
mod error;
mod global;
mod stats;

pub mod address;
pub mod ipt;
pub mod machine;
pub mod manager;
pub mod space;

#[cfg(test)]
mod tests;

pub use address::{PageNum, Pid, Ppn, Vaddr, Vpn, VpnRange};
pub use backing::{BackingStore, PageBacking};
pub use config::{VmConfig, DEFAULT_NUM_PHYS_PAGES, DEFAULT_PAGE_SIZE, DEFAULT_TLB_SIZE};
pub use error::{BackingKind, Severity, VmError, VmResult};
pub use global::{handle_tlb_miss, init_vm_manager, with_vm_manager};
pub use ipt::{FrameEntry, InvertedPageTable, PageLookup};
pub use machine::{Access, Machine, TlbEntry, TlbFlags};
pub use manager::{FaultAddress, FaultContext, MemoryManager, TlbFill};
pub use space::{AddressSpace, MmapRegion, MmapRegions, RegionResolver};
pub use stats::{ManualClock, StepClock, TickSource, VmStats};
