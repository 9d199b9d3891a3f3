//! 地址模块
//!
//! 提供虚拟地址、页码与进程标识的强类型封装。
//!
//! - [`Vaddr`] - 虚拟地址（缺页时由硬件给出）
//! - [`Vpn`] - 虚拟页码（Virtual Page Number）
//! - [`Ppn`] - 物理页码，即物理帧号，也是倒排页表的下标
//! - [`VpnRange`] - 闭区间 `[first, last]` 的虚拟页码范围
//! - [`Pid`] - 进程标识，用于倒排页表的所有权检查
//!
//! 页大小不是全局常量，而是由 [`crate::VmConfig`] 决定，因此涉及字节偏移的
//! 转换都显式接收 `page_size` 参数。

pub mod page_num;

pub use page_num::{PageNum, Ppn, Vpn, VpnRange, VpnRangeIter};

use core::fmt;

/// 虚拟地址
#[repr(transparent)]
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash)]
pub struct Vaddr(pub usize);

impl Vaddr {
    /// 获取地址数值
    pub const fn as_usize(self) -> usize {
        self.0
    }

    /// 地址在所在页内的偏移
    pub fn page_offset(self, page_size: usize) -> usize {
        self.0 % page_size
    }
}

impl From<usize> for Vaddr {
    fn from(value: usize) -> Self {
        Vaddr(value)
    }
}

impl fmt::LowerHex for Vaddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

/// 进程标识
#[repr(transparent)]
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash)]
pub struct Pid(pub usize);

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
