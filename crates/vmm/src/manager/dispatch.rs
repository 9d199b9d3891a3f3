//! TLB 缺失分派
//!
//! 流程：倒排页表查找 → 命中则直接装入 TLB；
//! 未命中则检查地址合法性 → 换出牺牲帧并换入 → 装入 TLB。

use super::{FaultAddress, FaultContext, MemoryManager, TlbFill};
use crate::address::Vpn;
use crate::error::{VmError, VmResult};
use crate::ipt::PageLookup;
use sync::IntrGuard;

impl MemoryManager {
    /// 处理一次 TLB 缺失
    ///
    /// 整个处理过程关闭中断。地址既不在地址空间页数上限内、也不被 mmap 覆盖时
    /// 返回 [`VmError::AddressError`]，此时不占用任何帧。
    pub fn handle_tlb_miss(
        &mut self,
        ctx: &FaultContext<'_>,
        fault: FaultAddress,
    ) -> VmResult<TlbFill> {
        let _guard = IntrGuard::new();

        let vaddr = match fault {
            FaultAddress::Kernel(vaddr) => vaddr,
            FaultAddress::User => self.machine.bad_vaddr(),
        };
        let vpn = Vpn::from_vaddr(vaddr, self.page_size());

        if let Some(ppn) = self.ipt.lookup(ctx.pid, vpn) {
            let slot = self.insert_tlb(vpn, ppn);
            return Ok(TlbFill {
                vpn,
                ppn,
                slot,
                paged_in: false,
            });
        }

        if !ctx.space.is_valid_page(vpn) {
            log::warn!(
                "address error: pid {} vaddr {:#x} (vpn {}) outside {} pages and not mmapped",
                ctx.pid,
                vaddr,
                vpn,
                ctx.space.num_pages()
            );
            return Err(VmError::AddressError { vaddr });
        }

        let ppn = self.page_out_page_in(ctx, vpn)?;
        let slot = self.insert_tlb(vpn, ppn);
        Ok(TlbFill {
            vpn,
            ppn,
            slot,
            paged_in: true,
        })
    }
}
