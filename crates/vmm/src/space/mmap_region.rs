//! mmap 区域
//!
//! 一个 mmap 区域把连续的虚拟页直接映射到文件：第 `vpn - begin` 页对应文件偏移
//! `(vpn - begin) × page_size`，只有末页可能是部分页。

use crate::address::{PageNum, Vpn, VpnRange};
use crate::backing::{BackingStore, PageBacking};
use crate::error::{BackingKind, VmError, VmResult};
use alloc::sync::Arc;
use alloc::vec::Vec;

/// 文件映射区域
#[derive(Clone)]
pub struct MmapRegion {
    /// 覆盖的虚拟页（闭区间）
    range: VpnRange,
    /// 末页中属于文件的字节数，`1..=page_size`
    last_page_len: usize,
    /// 被映射的文件
    file: Arc<dyn BackingStore>,
}

// 手动实现 Debug，因为 dyn BackingStore 没有实现 Debug
impl core::fmt::Debug for MmapRegion {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MmapRegion")
            .field("file", &"<dyn BackingStore>")
            .field("begin", &self.range.first())
            .field("end", &self.range.last())
            .field("last_page_len", &self.last_page_len)
            .finish()
    }
}

impl MmapRegion {
    /// 创建覆盖 `[begin, end]` 的区域
    ///
    /// # 错误
    /// `end < begin`，或 `last_page_len` 不在 `1..=page_size` 内时返回 [`VmError::InvalidRegion`]
    pub fn new(
        begin: Vpn,
        end: Vpn,
        last_page_len: usize,
        page_size: usize,
        file: Arc<dyn BackingStore>,
    ) -> VmResult<Self> {
        if end < begin || last_page_len == 0 || last_page_len > page_size {
            return Err(VmError::InvalidRegion);
        }
        Ok(Self {
            range: VpnRange::new(begin, end),
            last_page_len,
            file,
        })
    }

    /// 把长度为 `file_len` 字节的文件从 `begin` 页开始映射
    ///
    /// 文件占 `ceil(file_len / page_size)` 页，末页长度为剩余的字节数。
    pub fn from_file_len(
        begin: Vpn,
        file_len: usize,
        page_size: usize,
        file: Arc<dyn BackingStore>,
    ) -> VmResult<Self> {
        if file_len == 0 || page_size == 0 {
            return Err(VmError::InvalidRegion);
        }
        let pages = file_len.div_ceil(page_size);
        let last_page_len = file_len - (pages - 1) * page_size;
        let end = begin
            .as_usize()
            .checked_add(pages - 1)
            .ok_or(VmError::InvalidRegion)?;
        Self::new(begin, Vpn(end), last_page_len, page_size, file)
    }

    /// 首页
    pub fn begin_page(&self) -> Vpn {
        self.range.first()
    }

    /// 末页（包含）
    pub fn end_page(&self) -> Vpn {
        self.range.last()
    }

    /// 覆盖的页范围
    pub fn range(&self) -> VpnRange {
        self.range
    }

    /// 末页中属于文件的字节数
    pub fn last_page_len(&self) -> usize {
        self.last_page_len
    }

    /// 被映射的文件
    pub fn file(&self) -> &Arc<dyn BackingStore> {
        &self.file
    }

    /// 是否覆盖给定页
    pub fn contains(&self, vpn: Vpn) -> bool {
        self.range.contains(vpn)
    }

    /// `vpn` 页需要传输的字节数：末页为部分长度，其余为整页
    pub fn transfer_len(&self, vpn: Vpn, page_size: usize) -> usize {
        if vpn == self.end_page() {
            self.last_page_len
        } else {
            page_size
        }
    }

    /// `vpn` 页在文件中的偏移
    pub fn file_offset(&self, vpn: Vpn, page_size: usize) -> usize {
        (vpn.as_usize() - self.begin_page().as_usize()) * page_size
    }

    /// `vpn` 页在文件中的位置
    pub fn backing(&self, vpn: Vpn, page_size: usize) -> PageBacking {
        debug_assert!(self.contains(vpn));
        PageBacking {
            store: self.file.clone(),
            offset: self.file_offset(vpn, page_size),
            len: self.transfer_len(vpn, page_size),
            kind: BackingKind::Mmap,
        }
    }
}

/// 根据虚拟页查找覆盖它的 mmap 区域
///
/// 实现者可以使用任意索引结构，但必须保持“返回第一个覆盖该页的区域”的语义。
pub trait RegionResolver {
    /// 覆盖 `vpn` 的区域
    fn resolve(&self, vpn: Vpn) -> Option<&MmapRegion>;
}

/// 一个地址空间的 mmap 区域集合
///
/// 区域之间互不重叠，按首页升序保存。
#[derive(Debug, Default, Clone)]
pub struct MmapRegions {
    regions: Vec<MmapRegion>,
}

impl MmapRegions {
    /// 创建空集合
    pub const fn new() -> Self {
        Self {
            regions: Vec::new(),
        }
    }

    /// 插入区域并检测重叠
    pub fn insert(&mut self, region: MmapRegion) -> VmResult<()> {
        if self
            .regions
            .iter()
            .any(|existing| existing.range().overlaps(&region.range()))
        {
            return Err(VmError::RegionOverlap {
                begin: region.begin_page(),
                end: region.end_page(),
            });
        }
        let pos = self
            .regions
            .partition_point(|r| r.begin_page() < region.begin_page());
        self.regions.insert(pos, region);
        Ok(())
    }

    /// 移除首页为 `begin` 的区域
    pub fn remove(&mut self, begin: Vpn) -> Option<MmapRegion> {
        let pos = self.regions.iter().position(|r| r.begin_page() == begin)?;
        Some(self.regions.remove(pos))
    }

    /// 区域数量
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// 是否没有任何区域
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// 按首页升序遍历
    pub fn iter(&self) -> impl Iterator<Item = &MmapRegion> {
        self.regions.iter()
    }
}

impl RegionResolver for MmapRegions {
    // 线性扫描，区域数通常很少
    fn resolve(&self, vpn: Vpn) -> Option<&MmapRegion> {
        self.regions.iter().find(|r| r.contains(vpn))
    }
}
