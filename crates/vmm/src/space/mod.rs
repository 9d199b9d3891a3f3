//! 地址空间模块
//!
//! 地址空间由外部协作者（进程创建与 mmap 系统调用）构造，本子系统只读取：
//! 页数上限、交换区句柄与 mmap 区域集合。

mod address_space;
mod mmap_region;

pub use address_space::AddressSpace;
pub use mmap_region::{MmapRegion, MmapRegions, RegionResolver};
