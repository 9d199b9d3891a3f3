//! 页替换
//!
//! ## 牺牲帧选择 (LRU)
//!
//! 按帧号扫描：遇到第一个空闲帧立即返回；否则返回最近使用时刻最小的帧，
//! 相同时刻取帧号最小者。时刻只在 TLB 插入时刷新。
//!
//! ## 换出
//!
//! 先把 TLB 中的脏位拉回帧表并使槽位失效；帧为脏时写回所有者地址空间的
//! 后备存储（mmap 文件或交换区）；最后释放帧。
//!
//! ## 换入
//!
//! 从当前地址空间的后备存储读入，mmap 末页只读取部分长度，其余字节清零。

use super::{FaultContext, MemoryManager};
use crate::address::{Ppn, Vpn};
use crate::error::{VmError, VmResult};

impl MemoryManager {
    /// 选择牺牲帧
    pub fn lru_victim(&self) -> Ppn {
        let mut victim = Ppn(0);
        let mut oldest = u64::MAX;
        for (ppn, frame) in self.ipt.iter() {
            if !frame.is_valid() {
                return ppn;
            }
            if frame.last_used() < oldest {
                oldest = frame.last_used();
                victim = ppn;
            }
        }
        victim
    }

    /// 换出一帧，返回是否发生了写回
    ///
    /// 空闲帧直接返回 `Ok(false)`。写回失败时帧保持有效（TLB 槽位已失效，
    /// 脏位已记录在帧表中），错误返回给调用者。
    pub fn page_out(&mut self, ppn: Ppn) -> VmResult<bool> {
        if !self.ipt.entry(ppn).is_valid() {
            return Ok(false);
        }

        if let Some(slot) = self.ipt.entry_mut(ppn).take_tlb_slot() {
            let entry = &mut self.machine.tlb_mut()[slot];
            let dirty = entry.is_dirty();
            entry.invalidate();
            self.ipt.entry_mut(ppn).set_dirty(dirty);
        }

        let frame = self.ipt.entry(ppn);
        let mut written = false;
        if frame.is_dirty() {
            let (pid, vpn) = (frame.pid(), frame.vpn());
            let space = frame.space().cloned().ok_or(VmError::Inconsistent {
                what: "valid frame has no owning address space",
                index: ppn.0,
            })?;
            let backing = space.backing_for(vpn, self.page_size());
            log::debug!(
                "page out: pid {} vpn {} from ppn {} to {} offset {} ({} bytes)",
                pid,
                vpn,
                ppn,
                backing.kind,
                backing.offset,
                backing.len
            );
            backing.write_from(self.machine.frame(ppn))?;
            self.stats.page_outs += 1;
            written = true;
        }

        self.ipt.entry_mut(ppn).release();
        Ok(written)
    }

    /// 把 `vpn` 读入空闲帧 `ppn` 并登记所有者
    ///
    /// 登记后最近使用时刻为 0，由紧随其后的 TLB 插入刷新。
    pub(crate) fn page_in(&mut self, ctx: &FaultContext<'_>, ppn: Ppn, vpn: Vpn) -> VmResult<()> {
        let backing = ctx.space.backing_for(vpn, self.page_size());
        log::debug!(
            "page in: pid {} vpn {} into ppn {} from {} offset {} ({} bytes)",
            ctx.pid,
            vpn,
            ppn,
            backing.kind,
            backing.offset,
            backing.len
        );
        let buf = self.machine.frame_mut(ppn);
        backing.read_into(buf)?;
        buf[backing.len..].fill(0);

        self.ipt
            .entry_mut(ppn)
            .occupy(ctx.pid, vpn, ctx.space.clone());
        Ok(())
    }

    /// 为 `vpn` 腾出一帧并换入，返回帧号
    pub fn page_out_page_in(&mut self, ctx: &FaultContext<'_>, vpn: Vpn) -> VmResult<Ppn> {
        let victim = self.lru_victim();
        self.page_out(victim)?;
        self.page_in(ctx, victim, vpn)?;
        self.stats.page_faults += 1;
        Ok(victim)
    }
}
