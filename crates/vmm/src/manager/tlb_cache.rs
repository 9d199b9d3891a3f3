//! TLB 插入
//!
//! 优先使用空闲槽位，否则替换 FIFO 游标所指的槽位（不考虑 USE 位）。
//! 无论选中的槽位是否有效，游标都前进到 `(slot + 1) % tlb_size`。
//! 覆盖有效槽位前必须把其脏位写回倒排页表，否则之后的换出会丢失修改。

use super::MemoryManager;
use crate::address::{Ppn, Vpn};
use crate::machine::TlbEntry;

impl MemoryManager {
    /// 把 `vpn → ppn` 装入 TLB，返回使用的槽位
    pub(crate) fn insert_tlb(&mut self, vpn: Vpn, ppn: Ppn) -> usize {
        // 同一帧不能同时出现在两个槽位
        self.drop_stale_slot(ppn);

        let slot = match self.machine.tlb().iter().position(|e| !e.is_valid()) {
            Some(free) => {
                log::debug!("TLB: vpn {} -> ppn {} into free slot {}", vpn, ppn, free);
                free
            }
            None => {
                let victim = self.fifo_cursor;
                log::debug!(
                    "TLB: vpn {} -> ppn {} replaces slot {} (vpn {})",
                    vpn,
                    ppn,
                    victim,
                    self.machine.tlb()[victim].vpn
                );
                victim
            }
        };
        self.fifo_cursor = (slot + 1) % self.machine.tlb_size();

        let old = self.machine.tlb()[slot];
        if old.is_valid() {
            let frame = self.ipt.entry_mut(old.ppn);
            if frame.tlb_slot() == Some(slot) {
                frame.set_dirty(old.is_dirty());
                frame.set_tlb_slot(None);
            }
        }

        let dirty = self.ipt.entry(ppn).is_dirty();
        self.machine.tlb_mut()[slot] = TlbEntry::loaded(vpn, ppn, dirty);

        let tick = self.clock.now();
        let frame = self.ipt.entry_mut(ppn);
        frame.set_tlb_slot(Some(slot));
        frame.touch(tick);

        self.stats.tlb_misses += 1;
        slot
    }

    /// 使帧仍然挂着的旧槽位失效，并把该槽位的脏位拉回帧表
    fn drop_stale_slot(&mut self, ppn: Ppn) {
        let Some(slot) = self.ipt.entry_mut(ppn).take_tlb_slot() else {
            return;
        };
        let entry = &mut self.machine.tlb_mut()[slot];
        if entry.is_valid() && entry.ppn == ppn {
            let dirty = entry.is_dirty();
            entry.invalidate();
            self.ipt.entry_mut(ppn).set_dirty(dirty);
        }
    }

    /// 刷新整个 TLB
    ///
    /// TLB 不带进程标签，切换进程时必须调用。每个有效槽位的脏位写回帧表，
    /// 清除反向引用后使槽位失效。FIFO 游标保持不变。
    pub fn flush_tlb(&mut self) {
        let _guard = sync::IntrGuard::new();
        for slot in 0..self.machine.tlb_size() {
            let entry = self.machine.tlb()[slot];
            if !entry.is_valid() {
                continue;
            }
            let frame = self.ipt.entry_mut(entry.ppn);
            if frame.tlb_slot() == Some(slot) {
                frame.set_dirty(entry.is_dirty());
                frame.set_tlb_slot(None);
            }
            self.machine.tlb_mut()[slot].invalidate();
        }
        log::debug!("TLB: flushed");
    }
}
