// Unit tests for vmm.
//
// 宿主机上用 `cargo test` 运行。中断控制器与后备存储来自 `test-support`，
// 这里为它们实现本 crate 的 trait。

use crate::backing::BackingStore;
use crate::config::VmConfig;
use crate::manager::MemoryManager;
use crate::space::AddressSpace;
use crate::stats::ManualClock;
use alloc::boxed::Box;
use alloc::sync::Arc;
use std::sync::Once;
use test_support::mock::arch::{MockArchOps, MOCK_ARCH_OPS};
use test_support::mock::storage::MemStore;

mod dispatch;
mod scenarios;
mod tlb_fifo;
mod verify;

/// 测试使用的页大小
pub(crate) const PAGE: usize = 16;

struct HostArch(&'static MockArchOps);

impl sync::ArchOps for HostArch {
    unsafe fn read_and_disable_interrupts(&self) -> usize {
        unsafe { self.0.read_and_disable_interrupts() }
    }

    unsafe fn restore_interrupts(&self, flags: usize) {
        unsafe { self.0.restore_interrupts(flags) }
    }

    fn interrupt_enable_mask(&self) -> usize {
        self.0.sie_mask()
    }
}

static HOST_ARCH: HostArch = HostArch(&MOCK_ARCH_OPS);
static INIT: Once = Once::new();

impl BackingStore for MemStore {
    fn read_at(&self, offset: usize, buf: &mut [u8]) -> Result<usize, isize> {
        MemStore::read_at(self, offset, buf)
    }

    fn write_at(&self, offset: usize, buf: &[u8]) -> Result<usize, isize> {
        MemStore::write_at(self, offset, buf)
    }
}

/// 测试环境句柄
pub(crate) struct TestEnv;

/// 注册 mock 中断控制器
pub(crate) fn setup() -> TestEnv {
    // SAFETY: Once 保证只注册一次
    INIT.call_once(|| unsafe { sync::register_arch_ops(&HOST_ARCH) });
    TestEnv
}

/// `frames` 个物理帧、`tlb` 个 TLB 槽位、页大小 [`PAGE`]
pub(crate) fn config(frames: usize, tlb: usize) -> VmConfig {
    VmConfig::new()
        .with_page_size(PAGE)
        .with_phys_pages(frames)
        .with_tlb_size(tlb)
}

/// 使用 [`crate::StepClock`] 的管理器
pub(crate) fn manager(frames: usize, tlb: usize) -> MemoryManager {
    MemoryManager::new(config(frames, tlb)).unwrap()
}

/// 使用手动时钟的管理器
pub(crate) fn manual_manager(frames: usize, tlb: usize) -> (MemoryManager, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(1));
    let mm = MemoryManager::with_clock(config(frames, tlb), Box::new(clock.clone())).unwrap();
    (mm, clock)
}

/// 交换区足够容纳 `num_pages` 页的地址空间
pub(crate) fn mem_space(num_pages: usize) -> Arc<AddressSpace> {
    swap_space(num_pages).0
}

/// 同 [`mem_space`]，同时返回交换区以便检查
pub(crate) fn swap_space(num_pages: usize) -> (Arc<AddressSpace>, Arc<MemStore>) {
    let swap = Arc::new(MemStore::with_len(num_pages * PAGE));
    let space = Arc::new(AddressSpace::new(num_pages, swap.clone()));
    (space, swap)
}

/// 交换区中第 `vpn` 页的每个字节都是 `vpn + 1`
pub(crate) fn swap_with_pattern(num_pages: usize) -> (Arc<AddressSpace>, Arc<MemStore>) {
    let mut bytes = alloc::vec![0u8; num_pages * PAGE];
    for (vpn, page) in bytes.chunks_mut(PAGE).enumerate() {
        page.fill(vpn as u8 + 1);
    }
    let swap = Arc::new(MemStore::from_bytes(&bytes));
    let space = Arc::new(AddressSpace::new(num_pages, swap.clone()));
    (space, swap)
}
