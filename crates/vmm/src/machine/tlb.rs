//! TLB 条目
//!
//! 软件管理的 TLB：硬件只在命中时查表、置位 USE/DIRTY，
//! 缺失时由内核的缺页处理填充。

use crate::address::{Ppn, Vpn};
use bitflags::bitflags;

bitflags! {
    /// TLB 条目标志位
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TlbFlags: u8 {
        /// 条目有效
        const VALID = 1 << 0;
        /// 页在装入后被写过（硬件在写命中时置位）
        const DIRTY = 1 << 1;
        /// 只读（仅占位，不做权限检查）
        const READ_ONLY = 1 << 2;
        /// 页被访问过（硬件在命中时置位，替换策略不使用）
        const USE = 1 << 3;
    }
}

/// 一个 TLB 槽位
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TlbEntry {
    /// 虚拟页码
    pub vpn: Vpn,
    /// 物理帧号
    pub ppn: Ppn,
    /// 标志位
    pub flags: TlbFlags,
}

impl TlbEntry {
    /// 无效条目
    pub const fn invalid() -> Self {
        Self {
            vpn: Vpn(0),
            ppn: Ppn(0),
            flags: TlbFlags::empty(),
        }
    }

    /// 新装入的有效条目；dirty 沿用帧表中记录的值
    pub fn loaded(vpn: Vpn, ppn: Ppn, dirty: bool) -> Self {
        let mut flags = TlbFlags::VALID;
        flags.set(TlbFlags::DIRTY, dirty);
        Self { vpn, ppn, flags }
    }

    /// 是否有效
    pub fn is_valid(&self) -> bool {
        self.flags.contains(TlbFlags::VALID)
    }

    /// 是否被写过
    pub fn is_dirty(&self) -> bool {
        self.flags.contains(TlbFlags::DIRTY)
    }

    /// 是否只读
    pub fn is_read_only(&self) -> bool {
        self.flags.contains(TlbFlags::READ_ONLY)
    }

    /// 是否被访问过
    pub fn is_used(&self) -> bool {
        self.flags.contains(TlbFlags::USE)
    }

    /// 使条目失效（其余字段保留，便于调试）
    pub fn invalidate(&mut self) {
        self.flags.remove(TlbFlags::VALID);
    }
}

impl Default for TlbEntry {
    fn default() -> Self {
        Self::invalid()
    }
}
