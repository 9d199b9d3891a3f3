//! 经由 TLB 的内核读写
//!
//! 逐字节地像硬件一样翻译地址：缺失时锁存出错地址、处理缺失后重试一次。
//! 写访问会置位 TLB 的脏位。

use super::{FaultAddress, FaultContext, MemoryManager};
use crate::address::Vaddr;
use crate::error::{VmError, VmResult};
use crate::machine::Access;

impl MemoryManager {
    /// 从虚拟地址 `vaddr` 起读取 `buf.len()` 字节
    pub fn read_virtual(
        &mut self,
        ctx: &FaultContext<'_>,
        vaddr: Vaddr,
        buf: &mut [u8],
    ) -> VmResult<()> {
        for (i, byte) in buf.iter_mut().enumerate() {
            let addr = offset_addr(vaddr, i)?;
            let paddr = self.translate_or_fault(ctx, addr, Access::Read)?;
            *byte = self.machine.read_phys(paddr);
        }
        Ok(())
    }

    /// 把 `bytes` 写到虚拟地址 `vaddr` 起的位置
    pub fn write_virtual(
        &mut self,
        ctx: &FaultContext<'_>,
        vaddr: Vaddr,
        bytes: &[u8],
    ) -> VmResult<()> {
        for (i, &byte) in bytes.iter().enumerate() {
            let addr = offset_addr(vaddr, i)?;
            let paddr = self.translate_or_fault(ctx, addr, Access::Write)?;
            self.machine.write_phys(paddr, byte);
        }
        Ok(())
    }

    fn translate_or_fault(
        &mut self,
        ctx: &FaultContext<'_>,
        vaddr: Vaddr,
        access: Access,
    ) -> VmResult<usize> {
        if let Some(paddr) = self.machine.translate(vaddr, access) {
            return Ok(paddr);
        }
        self.handle_tlb_miss(ctx, FaultAddress::User)?;
        self.machine
            .translate(vaddr, access)
            .ok_or(VmError::Inconsistent {
                what: "translation missed right after a TLB fill",
                index: vaddr.as_usize(),
            })
    }
}

fn offset_addr(base: Vaddr, offset: usize) -> VmResult<Vaddr> {
    base.as_usize()
        .checked_add(offset)
        .map(Vaddr)
        .ok_or(VmError::AddressError { vaddr: base })
}
