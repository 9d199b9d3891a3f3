//! 虚拟内存错误类型
//!
//! 缺页处理中的错误不会在子系统内部直接停机，而是作为 [`VmError`] 返回给调用者，
//! 由调用者根据 [`VmError::severity`] 决定终止线程、停机还是拒绝请求。

use crate::address::{Vaddr, Vpn};
use core::fmt;

/// 后备存储的种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackingKind {
    /// 进程的交换区
    Swap,
    /// mmap 映射的文件
    Mmap,
}

impl fmt::Display for BackingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackingKind::Swap => f.write_str("swap"),
            BackingKind::Mmap => f.write_str("mmap"),
        }
    }
}

/// 错误的严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// 对出错线程致命（地址错误），不重试
    ThreadFatal,
    /// 对内核致命（后备存储传输不足或 I/O 失败）
    KernelFatal,
    /// 请求被拒绝，系统状态未改变
    Rejected,
}

/// 虚拟内存子系统的错误
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmError {
    /// 页码超出地址空间且不在任何 mmap 区域内
    AddressError {
        /// 出错的虚拟地址
        vaddr: Vaddr,
    },
    /// 后备存储传输的字节数与期望不符
    ShortTransfer {
        /// 后备存储种类
        kind: BackingKind,
        /// 传输的字节偏移
        offset: usize,
        /// 期望的字节数
        expected: usize,
        /// 实际传输的字节数
        actual: usize,
    },
    /// 后备存储报告错误
    Io {
        /// 后备存储种类
        kind: BackingKind,
        /// 传输的字节偏移
        offset: usize,
        /// 后备存储返回的错误码
        errno: isize,
    },
    /// 新的 mmap 区域与已有区域重叠
    RegionOverlap {
        /// 新区域首页
        begin: Vpn,
        /// 新区域末页
        end: Vpn,
    },
    /// mmap 区域参数无效（末页在首页之前、末页长度越界等）
    InvalidRegion,
    /// 机器配置无效
    InvalidConfig(&'static str),
    /// 一致性检查发现的不变量破坏
    Inconsistent {
        /// 被破坏的不变量
        what: &'static str,
        /// 相关的帧号或 TLB 槽位
        index: usize,
    },
    /// 全局实例尚未初始化
    NotInitialized,
}

impl VmError {
    /// 错误的严重程度
    pub fn severity(&self) -> Severity {
        match self {
            VmError::AddressError { .. } => Severity::ThreadFatal,
            VmError::ShortTransfer { .. } | VmError::Io { .. } | VmError::Inconsistent { .. } => {
                Severity::KernelFatal
            }
            VmError::RegionOverlap { .. }
            | VmError::InvalidRegion
            | VmError::InvalidConfig(_)
            | VmError::NotInitialized => Severity::Rejected,
        }
    }
}

impl fmt::Display for VmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VmError::AddressError { vaddr } => write!(f, "address error at {:#x}", vaddr),
            VmError::ShortTransfer {
                kind,
                offset,
                expected,
                actual,
            } => write!(
                f,
                "{} transfer at offset {} moved {} of {} bytes",
                kind, offset, actual, expected
            ),
            VmError::Io { kind, offset, errno } => {
                write!(f, "{} I/O failed at offset {} (errno {})", kind, offset, errno)
            }
            VmError::RegionOverlap { begin, end } => {
                write!(f, "mmap region [{}, {}] overlaps an existing region", begin, end)
            }
            VmError::InvalidRegion => f.write_str("invalid mmap region"),
            VmError::InvalidConfig(why) => write!(f, "invalid configuration: {}", why),
            VmError::Inconsistent { what, index } => {
                write!(f, "inconsistent state at {}: {}", index, what)
            }
            VmError::NotInitialized => f.write_str("memory manager not initialized"),
        }
    }
}

/// 虚拟内存操作的结果类型
pub type VmResult<T> = Result<T, VmError>;
