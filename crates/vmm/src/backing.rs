//! 后备存储接口
//!
//! 交换区与被映射文件都只需要按字节偏移读写的能力，由 [`BackingStore`] 抽象；
//! 文件系统中的具体实现由内核提供。

use crate::error::{BackingKind, VmError, VmResult};
use alloc::sync::Arc;

/// 可按偏移读写的后备存储
///
/// 交换区按 `vpn × page_size` 平铺；被映射文件保持其自然布局。
pub trait BackingStore: Send + Sync {
    /// 从指定偏移读取数据到缓冲区，返回实际读取的字节数
    fn read_at(&self, offset: usize, buf: &mut [u8]) -> Result<usize, isize>;

    /// 将缓冲区数据写入指定偏移，返回实际写入的字节数
    fn write_at(&self, offset: usize, buf: &[u8]) -> Result<usize, isize>;
}

/// 一个虚拟页在后备存储中的位置
///
/// 由 [`crate::AddressSpace::backing_for`] 解析得到：mmap 覆盖的页指向被映射文件，
/// 其余页指向交换区。
#[derive(Clone)]
pub struct PageBacking {
    /// 后备存储
    pub store: Arc<dyn BackingStore>,
    /// 字节偏移
    pub offset: usize,
    /// 需要传输的字节数（整页，或 mmap 区域末页的部分长度）
    pub len: usize,
    /// 后备存储种类
    pub kind: BackingKind,
}

impl core::fmt::Debug for PageBacking {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PageBacking")
            .field("store", &"<dyn BackingStore>")
            .field("offset", &self.offset)
            .field("len", &self.len)
            .field("kind", &self.kind)
            .finish()
    }
}

impl PageBacking {
    /// 从后备存储读入 `buf[..len]`，字节数不足视为错误
    ///
    /// `len` 超过 `buf` 长度（区域按更大的页大小构造）时返回 [`VmError::InvalidRegion`]。
    pub fn read_into(&self, buf: &mut [u8]) -> VmResult<()> {
        self.fits(buf.len())?;
        let actual = self
            .store
            .read_at(self.offset, &mut buf[..self.len])
            .map_err(|errno| self.io_error(errno))?;
        self.check(actual)
    }

    /// 将 `buf[..len]` 写回后备存储，字节数不足视为错误
    pub fn write_from(&self, buf: &[u8]) -> VmResult<()> {
        self.fits(buf.len())?;
        let actual = self
            .store
            .write_at(self.offset, &buf[..self.len])
            .map_err(|errno| self.io_error(errno))?;
        self.check(actual)
    }

    fn fits(&self, frame_len: usize) -> VmResult<()> {
        if self.len > frame_len {
            log::error!(
                "{} transfer at offset {}: {} bytes do not fit a {}-byte frame",
                self.kind,
                self.offset,
                self.len,
                frame_len
            );
            return Err(VmError::InvalidRegion);
        }
        Ok(())
    }

    fn check(&self, actual: usize) -> VmResult<()> {
        if actual != self.len {
            log::error!(
                "{} transfer at offset {}: expected {}, got {}",
                self.kind,
                self.offset,
                self.len,
                actual
            );
            return Err(VmError::ShortTransfer {
                kind: self.kind,
                offset: self.offset,
                expected: self.len,
                actual,
            });
        }
        Ok(())
    }

    fn io_error(&self, errno: isize) -> VmError {
        log::error!(
            "{} I/O failed at offset {} (errno {})",
            self.kind,
            self.offset,
            errno
        );
        VmError::Io {
            kind: self.kind,
            offset: self.offset,
            errno,
        }
    }
}
