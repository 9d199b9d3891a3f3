//! 一致性检查
//!
//! 检查 TLB 与倒排页表之间的结构不变量，发现第一处破坏即返回
//! [`VmError::Inconsistent`]。

use super::MemoryManager;
use crate::error::{VmError, VmResult};

fn broken(what: &'static str, index: usize) -> VmError {
    log::error!("verify: {} ({})", what, index);
    VmError::Inconsistent { what, index }
}

impl MemoryManager {
    /// 检查 TLB 与倒排页表的一致性
    ///
    /// - 每个有效 TLB 槽位映射一个有效帧，且该帧的反向引用指回此槽位
    /// - 每个帧的反向引用指向一个映射回本帧的有效槽位
    /// - 没有两个有效槽位映射同一帧
    /// - 没有两个有效帧属于同一 (pid, vpn)
    pub fn verify(&self) -> VmResult<()> {
        let tlb = self.machine.tlb();

        for (slot, entry) in tlb.iter().enumerate() {
            if !entry.is_valid() {
                continue;
            }
            if entry.ppn.0 >= self.ipt.len() {
                return Err(broken("TLB slot maps a frame out of range", slot));
            }
            let frame = self.ipt.entry(entry.ppn);
            if !frame.is_valid() {
                return Err(broken("TLB slot maps a free frame", slot));
            }
            if frame.tlb_slot() != Some(slot) {
                return Err(broken("TLB slot is not referenced by its frame", slot));
            }
            if frame.vpn() != entry.vpn {
                return Err(broken("TLB slot vpn differs from its frame owner", slot));
            }
            if tlb[..slot]
                .iter()
                .any(|other| other.is_valid() && other.ppn == entry.ppn)
            {
                return Err(broken("two TLB slots map the same frame", slot));
            }
        }

        for (ppn, frame) in self.ipt.iter() {
            if let Some(slot) = frame.tlb_slot() {
                if !frame.is_valid() {
                    return Err(broken("free frame keeps a TLB back-reference", ppn.0));
                }
                match tlb.get(slot) {
                    Some(entry) if entry.is_valid() && entry.ppn == ppn => {}
                    _ => return Err(broken("frame back-reference names a stale slot", ppn.0)),
                }
            }
            if !frame.is_valid() {
                continue;
            }
            if frame.space().is_none() {
                return Err(broken("valid frame has no owning address space", ppn.0));
            }
            if self
                .ipt
                .iter()
                .take(ppn.0)
                .any(|(_, other)| other.is_owned_by(frame.pid(), frame.vpn()))
            {
                return Err(broken("two frames share one (pid, vpn) owner", ppn.0));
            }
        }

        Ok(())
    }
}
