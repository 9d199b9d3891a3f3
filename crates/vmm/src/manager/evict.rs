//! 批量换出与回收
//!
//! 由外部协作者在 munmap 或地址空间销毁时调用。

use super::{FaultContext, MemoryManager};
use crate::address::{Pid, Ppn, Vpn, VpnRange};
use crate::error::{VmError, VmResult};
use crate::ipt::PageLookup;
use alloc::vec::Vec;
use sync::IntrGuard;

impl MemoryManager {
    /// 换出 `range` 内当前进程驻留的所有页，返回换出的帧数
    ///
    /// 脏页写回后备存储，未驻留的页直接跳过。
    pub fn evict_range(&mut self, ctx: &FaultContext<'_>, range: VpnRange) -> VmResult<usize> {
        let _guard = IntrGuard::new();
        let mut evicted = 0;
        for vpn in range {
            if let Some(ppn) = self.ipt.lookup(ctx.pid, vpn) {
                self.page_out(ppn)?;
                evicted += 1;
            }
        }
        log::debug!(
            "evict: pid {} pages [{}, {}], {} frames freed",
            ctx.pid,
            range.first(),
            range.last(),
            evicted
        );
        Ok(evicted)
    }

    /// 解除首页为 `begin` 的 mmap 区域
    ///
    /// 先换出区域内驻留的页（脏数据写回文件），再从地址空间摘除区域。
    /// 写回失败时区域保持挂载。
    pub fn munmap(&mut self, ctx: &FaultContext<'_>, begin: Vpn) -> VmResult<usize> {
        let range = ctx
            .space
            .mmap_range(begin)
            .filter(|r| r.first() == begin)
            .ok_or(VmError::InvalidRegion)?;
        let evicted = self.evict_range(ctx, range)?;
        ctx.space.remove_mmap(begin);
        Ok(evicted)
    }

    /// 回收进程拥有的所有帧，返回回收的帧数
    ///
    /// 不写回：退出进程的交换区内容被丢弃。mmap 区域应先通过
    /// [`MemoryManager::munmap`] 写回。
    pub fn release_process(&mut self, pid: Pid) -> usize {
        let _guard = IntrGuard::new();
        let frames: Vec<Ppn> = self.ipt.frames_of(pid).collect();
        for &ppn in &frames {
            if let Some(slot) = self.ipt.entry_mut(ppn).take_tlb_slot() {
                self.machine.tlb_mut()[slot].invalidate();
            }
            self.ipt.entry_mut(ppn).release();
        }
        log::debug!("release: pid {}, {} frames", pid, frames.len());
        frames.len()
    }
}
