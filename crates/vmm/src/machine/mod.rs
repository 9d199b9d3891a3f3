//! 机器模型
//!
//! 本模块镜像了缺页处理需要直接操作的硬件状态：
//!
//! - 主存：`num_phys_pages × page_size` 字节，按帧号切分
//! - TLB：固定容量的 [`TlbEntry`] 数组，由所有进程共享（无 ASID，切换进程时需要刷新）
//! - 出错地址寄存器：TLB 缺失时锁存出错的虚拟地址
//!
//! [`Machine::translate`] 模拟硬件的地址转换：命中时置位 USE（写访问再置位 DIRTY），
//! 缺失时锁存地址并交给缺页处理。

mod tlb;

pub use tlb::{TlbEntry, TlbFlags};

use crate::address::{PageNum, Ppn, Vaddr, Vpn};
use crate::config::VmConfig;
use alloc::vec;
use alloc::vec::Vec;
use core::ops::Range;

/// 访问类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// 读
    Read,
    /// 写
    Write,
}

/// 被模拟机器的内存管理硬件
#[derive(Debug)]
pub struct Machine {
    page_size: usize,
    memory: Vec<u8>,
    tlb: Vec<TlbEntry>,
    bad_vaddr: Vaddr,
}

impl Machine {
    /// 按配置创建主存全零、TLB 全部无效的机器
    pub fn new(config: &VmConfig) -> Self {
        Self {
            page_size: config.page_size,
            memory: vec![0u8; config.memory_size()],
            tlb: vec![TlbEntry::invalid(); config.tlb_size],
            bad_vaddr: Vaddr(0),
        }
    }

    /// 页大小
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// 物理帧数量
    pub fn num_frames(&self) -> usize {
        self.memory.len() / self.page_size
    }

    /// TLB 槽位
    pub fn tlb(&self) -> &[TlbEntry] {
        &self.tlb
    }

    /// TLB 槽位（可变）
    pub fn tlb_mut(&mut self) -> &mut [TlbEntry] {
        &mut self.tlb
    }

    /// TLB 容量
    pub fn tlb_size(&self) -> usize {
        self.tlb.len()
    }

    fn frame_range(&self, ppn: Ppn) -> Range<usize> {
        let start = ppn.byte_offset(self.page_size);
        start..start + self.page_size
    }

    /// 帧的内容
    pub fn frame(&self, ppn: Ppn) -> &[u8] {
        let range = self.frame_range(ppn);
        &self.memory[range]
    }

    /// 帧的内容（可变）
    pub fn frame_mut(&mut self, ppn: Ppn) -> &mut [u8] {
        let range = self.frame_range(ppn);
        &mut self.memory[range]
    }

    /// 整个主存
    pub fn memory(&self) -> &[u8] {
        &self.memory
    }

    /// 读取出错地址寄存器
    pub fn bad_vaddr(&self) -> Vaddr {
        self.bad_vaddr
    }

    /// 写入出错地址寄存器
    pub fn set_bad_vaddr(&mut self, vaddr: Vaddr) {
        self.bad_vaddr = vaddr;
    }

    /// 通过 TLB 把虚拟地址转换为物理地址
    ///
    /// 命中时置位 USE，写访问还会置位 DIRTY，返回主存中的字节偏移；
    /// 缺失时把地址锁存到出错地址寄存器并返回 `None`。
    /// READ_ONLY 不做检查。
    pub fn translate(&mut self, vaddr: Vaddr, access: Access) -> Option<usize> {
        let vpn = Vpn::from_vaddr(vaddr, self.page_size);
        let offset = vaddr.page_offset(self.page_size);
        let page_size = self.page_size;
        match self
            .tlb
            .iter_mut()
            .find(|e| e.is_valid() && e.vpn == vpn)
        {
            Some(entry) => {
                entry.flags.insert(TlbFlags::USE);
                if access == Access::Write {
                    entry.flags.insert(TlbFlags::DIRTY);
                }
                Some(entry.ppn.byte_offset(page_size) + offset)
            }
            None => {
                self.bad_vaddr = vaddr;
                None
            }
        }
    }

    /// 读取物理地址处的字节
    pub fn read_phys(&self, paddr: usize) -> u8 {
        self.memory[paddr]
    }

    /// 写入物理地址处的字节
    pub fn write_phys(&mut self, paddr: usize, value: u8) {
        self.memory[paddr] = value;
    }
}
