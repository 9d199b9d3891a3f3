//! 地址空间

use crate::address::{PageNum, Vpn, VpnRange};
use crate::backing::{BackingStore, PageBacking};
use crate::error::{BackingKind, VmResult};
use crate::space::mmap_region::{MmapRegion, MmapRegions, RegionResolver};
use alloc::sync::Arc;
use sync::IntrMutex;

/// 一个进程的地址空间（由地址空间的构造者创建，本子系统只读取）
///
/// - 页数上限：`[0, num_pages)` 内的页由交换区提供
/// - 交换区：按 `vpn × page_size` 平铺
/// - mmap 区域：覆盖的页由被映射文件提供，优先于交换区
///
/// 地址空间通过 `Arc` 共享：倒排页表中的每个有效帧都持有其所有者地址空间的引用，
/// 以便换出其它进程的页时仍能找到正确的后备存储。
pub struct AddressSpace {
    num_pages: usize,
    swap: Arc<dyn BackingStore>,
    regions: IntrMutex<MmapRegions>,
}

impl core::fmt::Debug for AddressSpace {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AddressSpace")
            .field("num_pages", &self.num_pages)
            .field("swap", &"<dyn BackingStore>")
            .field("regions", &*self.regions.lock())
            .finish()
    }
}

impl AddressSpace {
    /// 创建一个没有 mmap 区域的地址空间
    pub fn new(num_pages: usize, swap: Arc<dyn BackingStore>) -> Self {
        Self {
            num_pages,
            swap,
            regions: IntrMutex::new(MmapRegions::new()),
        }
    }

    /// 页数上限
    pub fn num_pages(&self) -> usize {
        self.num_pages
    }

    /// 交换区
    pub fn swap(&self) -> &Arc<dyn BackingStore> {
        &self.swap
    }

    /// 添加 mmap 区域，与已有区域重叠时失败
    pub fn add_mmap(&self, region: MmapRegion) -> VmResult<()> {
        log::debug!(
            "mmap: add region [{}, {}], last page {} bytes",
            region.begin_page(),
            region.end_page(),
            region.last_page_len()
        );
        self.regions.lock().insert(region)
    }

    /// 摘除首页为 `begin` 的 mmap 区域
    ///
    /// 只修改区域表；驻留的页应先通过 [`crate::MemoryManager::evict_range`] 写回。
    pub fn remove_mmap(&self, begin: Vpn) -> Option<MmapRegion> {
        self.regions.lock().remove(begin)
    }

    /// 覆盖 `vpn` 的 mmap 区域的页范围
    pub fn mmap_range(&self, vpn: Vpn) -> Option<VpnRange> {
        self.regions.lock().resolve(vpn).map(|r| r.range())
    }

    /// `vpn` 是否被某个 mmap 区域覆盖
    pub fn is_mmapped(&self, vpn: Vpn) -> bool {
        self.regions.lock().resolve(vpn).is_some()
    }

    /// mmap 区域数量
    pub fn mmap_count(&self) -> usize {
        self.regions.lock().len()
    }

    /// `vpn` 是否是合法页：在页数上限内，或被 mmap 区域覆盖
    pub fn is_valid_page(&self, vpn: Vpn) -> bool {
        vpn.as_usize() < self.num_pages || self.is_mmapped(vpn)
    }

    /// 解析 `vpn` 的后备位置
    ///
    /// mmap 覆盖的页返回文件中的位置（末页只传输部分长度）；
    /// 否则返回交换区中偏移 `vpn × page_size` 处的一整页。
    pub fn backing_for(&self, vpn: Vpn, page_size: usize) -> PageBacking {
        if let Some(region) = self.regions.lock().resolve(vpn) {
            return region.backing(vpn, page_size);
        }
        PageBacking {
            store: self.swap.clone(),
            offset: vpn.byte_offset(page_size),
            len: page_size,
            kind: BackingKind::Swap,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{mem_space, setup};
    use test_support::mock::storage::MemStore;

    #[test]
    fn test_mmap_takes_precedence_over_swap() {
        let _env = setup();
        let space = mem_space(8);
        let file: Arc<dyn BackingStore> = Arc::new(MemStore::new());
        space
            .add_mmap(MmapRegion::new(Vpn(2), Vpn(3), 10, 16, file).unwrap())
            .unwrap();

        let swap = space.backing_for(Vpn(1), 16);
        assert_eq!((swap.kind, swap.offset, swap.len), (BackingKind::Swap, 16, 16));

        let mapped = space.backing_for(Vpn(3), 16);
        assert_eq!((mapped.kind, mapped.offset, mapped.len), (BackingKind::Mmap, 16, 10));
    }

    #[test]
    fn test_valid_page_bound_or_mmap() {
        let _env = setup();
        let space = mem_space(4);
        assert!(space.is_valid_page(Vpn(3)));
        assert!(!space.is_valid_page(Vpn(4)));

        let file: Arc<dyn BackingStore> = Arc::new(MemStore::new());
        space
            .add_mmap(MmapRegion::new(Vpn(20), Vpn(20), 1, 16, file).unwrap())
            .unwrap();
        assert!(space.is_valid_page(Vpn(20)));
        assert_eq!(space.mmap_range(Vpn(20)).map(|r| r.len()), Some(1));

        assert!(space.remove_mmap(Vpn(20)).is_some());
        assert!(!space.is_valid_page(Vpn(20)));
        assert_eq!(space.mmap_count(), 0);
    }
}
