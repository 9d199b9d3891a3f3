use super::*;
use crate::address::{Pid, Ppn, Vaddr, Vpn, VpnRange};
use crate::config::VmConfig;
use crate::error::VmError;
use crate::ipt::PageLookup;
use crate::machine::Access;
use crate::manager::{FaultAddress, FaultContext};
use crate::space::MmapRegion;
use test_support::mock::storage::TransferOp;

#[test]
fn test_four_pages_two_frames() {
    let _env = setup();
    let mut mm = manager(2, 4);
    let space = mem_space(4);
    let ctx = FaultContext::new(Pid(1), &space);

    let frames: alloc::vec::Vec<_> = (0..4)
        .map(|vpn| {
            mm.handle_tlb_miss(&ctx, FaultAddress::Kernel(Vaddr(vpn * PAGE)))
                .unwrap()
                .ppn
        })
        .collect();

    assert_eq!(frames, [Ppn(0), Ppn(1), Ppn(0), Ppn(1)]);
    assert_eq!(mm.ipt().lookup(Pid(1), Vpn(0)), None);
    assert_eq!(mm.ipt().lookup(Pid(1), Vpn(1)), None);
    assert_eq!(mm.ipt().lookup(Pid(1), Vpn(2)), Some(Ppn(0)));
    assert_eq!(mm.ipt().lookup(Pid(1), Vpn(3)), Some(Ppn(1)));
    assert_eq!(mm.stats().page_faults, 4);
    mm.verify().unwrap();
}

#[test]
fn test_out_of_bound_fault_is_address_error() {
    let _env = setup();
    let mut mm = manager(4, 4);
    let space = mem_space(5);
    let ctx = FaultContext::new(Pid(1), &space);

    let vaddr = Vaddr(10 * PAGE);
    assert_eq!(
        mm.handle_tlb_miss(&ctx, FaultAddress::Kernel(vaddr)),
        Err(VmError::AddressError { vaddr })
    );
    assert_eq!(mm.ipt().resident(), 0);
}

#[test]
fn test_fifth_insert_evicts_slot_zero() {
    let _env = setup();
    let mut mm = manager(8, 4);
    let space = mem_space(8);
    let ctx = FaultContext::new(Pid(1), &space);

    for vpn in 0..4 {
        mm.handle_tlb_miss(&ctx, FaultAddress::Kernel(Vaddr(vpn * PAGE)))
            .unwrap();
    }
    // 访问模式不影响 FIFO
    for _ in 0..3 {
        mm.machine_mut().translate(Vaddr(0), Access::Read).unwrap();
    }
    let fill = mm
        .handle_tlb_miss(&ctx, FaultAddress::Kernel(Vaddr(4 * PAGE)))
        .unwrap();

    assert_eq!(fill.slot, 0);
    assert_eq!(mm.machine().tlb()[0].vpn, Vpn(4));
    assert_eq!(mm.machine().tlb()[1].vpn, Vpn(1));
}

#[test]
fn test_partial_last_page_writes_37_bytes() {
    let _env = setup();
    let config = VmConfig::new()
        .with_page_size(64)
        .with_phys_pages(2)
        .with_tlb_size(2);
    let mut mm = MemoryManager::new(config).unwrap();
    let swap = Arc::new(MemStore::with_len(64));
    let space = Arc::new(AddressSpace::new(1, swap));
    let file = Arc::new(MemStore::with_len(37));
    space
        .add_mmap(MmapRegion::new(Vpn(4), Vpn(4), 37, 64, file.clone()).unwrap())
        .unwrap();
    let ctx = FaultContext::new(Pid(1), &space);

    mm.write_virtual(&ctx, Vaddr(4 * 64), &[0xEE]).unwrap();
    let evicted = mm.evict_range(&ctx, VpnRange::new(Vpn(4), Vpn(4))).unwrap();

    assert_eq!(evicted, 1);
    let writes = file.transfers_of(TransferOp::Write);
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].offset, 0);
    assert_eq!(writes[0].requested, 37);
    assert_eq!(writes[0].done, 37);
    assert_eq!(file.len(), 37);
    assert_eq!(file.contents()[0], 0xEE);
}
