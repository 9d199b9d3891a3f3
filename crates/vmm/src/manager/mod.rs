//! 内存管理器
//!
//! [`MemoryManager`] 持有机器状态（主存与 TLB）、倒排页表、TLB 的 FIFO 游标、
//! 时钟与计数器。所有缺页处理都以显式的 [`FaultContext`] 传入当前进程与地址空间，
//! 不读取任何环境中的“当前进程”。
//!
//! # 模块组成
//!
//! - `dispatch`：TLB 缺失分派
//! - `tlb_cache`：TLB 插入（FIFO 替换与脏位写回）
//! - `replace`：LRU 选择牺牲帧、换出与换入
//! - `evict`：批量换出、munmap、TLB 刷新与进程回收
//! - `access`：经由 TLB 的内核读写
//! - `verify`：一致性检查
//!
//! # 并发
//!
//! 管理器本身不加锁，由 `&mut self` 保证独占；修改 TLB 与倒排页表的入口
//! 在执行期间持有 [`sync::IntrGuard`]。

mod access;
mod dispatch;
mod evict;
mod replace;
mod tlb_cache;
mod verify;

use crate::address::{Pid, Ppn, Vaddr, Vpn};
use crate::config::VmConfig;
use crate::error::VmResult;
use crate::ipt::InvertedPageTable;
use crate::machine::Machine;
use crate::space::AddressSpace;
use crate::stats::{StepClock, TickSource, VmStats};
use alloc::boxed::Box;
use alloc::sync::Arc;

/// 出错地址的来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultAddress {
    /// 内核代码直接给出的地址
    Kernel(Vaddr),
    /// 用户态缺失，地址从出错地址寄存器读取
    User,
}

/// 一次缺页处理的上下文：当前进程与其地址空间
#[derive(Debug, Clone, Copy)]
pub struct FaultContext<'a> {
    /// 当前进程
    pub pid: Pid,
    /// 当前地址空间
    pub space: &'a Arc<AddressSpace>,
}

impl<'a> FaultContext<'a> {
    /// 创建上下文
    pub fn new(pid: Pid, space: &'a Arc<AddressSpace>) -> Self {
        Self { pid, space }
    }
}

/// 一次 TLB 填充的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TlbFill {
    /// 虚拟页
    pub vpn: Vpn,
    /// 物理帧
    pub ppn: Ppn,
    /// 装入的 TLB 槽位
    pub slot: usize,
    /// 是否经过了换入（倒排页表未命中）
    pub paged_in: bool,
}

/// 虚拟内存子系统
pub struct MemoryManager {
    config: VmConfig,
    machine: Machine,
    ipt: InvertedPageTable,
    fifo_cursor: usize,
    clock: Box<dyn TickSource>,
    stats: VmStats,
}

impl core::fmt::Debug for MemoryManager {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MemoryManager")
            .field("config", &self.config)
            .field("fifo_cursor", &self.fifo_cursor)
            .field("resident", &self.ipt.resident())
            .field("stats", &self.stats)
            .finish()
    }
}

impl MemoryManager {
    /// 使用 [`StepClock`] 创建管理器
    pub fn new(config: VmConfig) -> VmResult<Self> {
        Self::with_clock(config, Box::new(StepClock::new()))
    }

    /// 使用给定时钟创建管理器
    pub fn with_clock(config: VmConfig, clock: Box<dyn TickSource>) -> VmResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            machine: Machine::new(&config),
            ipt: InvertedPageTable::new(config.num_phys_pages),
            fifo_cursor: 0,
            clock,
            stats: VmStats::default(),
        })
    }

    /// 机器配置
    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    /// 页大小
    pub fn page_size(&self) -> usize {
        self.config.page_size
    }

    /// 计数器快照
    pub fn stats(&self) -> VmStats {
        self.stats
    }

    /// 机器状态
    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    /// 机器状态（可变），供内核模拟硬件访问
    pub fn machine_mut(&mut self) -> &mut Machine {
        &mut self.machine
    }

    /// 倒排页表
    pub fn ipt(&self) -> &InvertedPageTable {
        &self.ipt
    }

    /// 下一次 FIFO 替换的槽位
    pub fn fifo_cursor(&self) -> usize {
        self.fifo_cursor
    }

    /// 以 trace 级别输出 TLB 与倒排页表
    pub fn dump(&self) {
        for (slot, e) in self.machine.tlb().iter().enumerate() {
            log::trace!(
                "TLB[{}] = vpn[{}] ppn[{}] valid[{}] dirty[{}] use[{}]",
                slot,
                e.vpn,
                e.ppn,
                e.is_valid(),
                e.is_dirty(),
                e.is_used()
            );
        }
        self.ipt.dump();
    }
}
