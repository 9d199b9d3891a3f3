use super::*;
use crate::address::{Pid, Ppn, Vaddr, Vpn};
use crate::error::{BackingKind, Severity, VmError};
use crate::ipt::PageLookup;
use crate::manager::{FaultAddress, FaultContext};
use crate::space::MmapRegion;

#[test]
fn test_ipt_miss_pages_in_and_fills_tlb() {
    let _env = setup();
    let mut mm = manager(4, 4);
    let (space, _swap) = swap_with_pattern(8);
    let ctx = FaultContext::new(Pid(1), &space);

    let fill = mm
        .handle_tlb_miss(&ctx, FaultAddress::Kernel(Vaddr(3 * PAGE + 5)))
        .unwrap();

    assert_eq!(fill.vpn, Vpn(3));
    assert_eq!(fill.ppn, Ppn(0));
    assert_eq!(fill.slot, 0);
    assert!(fill.paged_in);
    assert!(mm.machine().frame(Ppn(0)).iter().all(|&b| b == 4));
    assert_eq!(mm.ipt().lookup(Pid(1), Vpn(3)), Some(Ppn(0)));

    let stats = mm.stats();
    assert_eq!(stats.tlb_misses, 1);
    assert_eq!(stats.page_faults, 1);
    assert_eq!(stats.page_outs, 0);
    mm.verify().unwrap();
}

#[test]
fn test_ipt_hit_skips_page_in() {
    let _env = setup();
    let mut mm = manager(4, 4);
    let space = mem_space(8);
    let ctx = FaultContext::new(Pid(1), &space);

    let first = mm.handle_tlb_miss(&ctx, FaultAddress::Kernel(Vaddr(PAGE))).unwrap();
    mm.flush_tlb();
    let again = mm.handle_tlb_miss(&ctx, FaultAddress::Kernel(Vaddr(PAGE))).unwrap();

    assert!(!again.paged_in);
    assert_eq!(again.ppn, first.ppn);
    assert_eq!(mm.stats().page_faults, 1);
    assert_eq!(mm.stats().tlb_misses, 2);
    mm.verify().unwrap();
}

#[test]
fn test_user_fault_reads_bad_vaddr_register() {
    let _env = setup();
    let mut mm = manager(4, 4);
    let space = mem_space(8);
    let ctx = FaultContext::new(Pid(1), &space);

    mm.machine_mut().set_bad_vaddr(Vaddr(2 * PAGE + 1));
    let fill = mm.handle_tlb_miss(&ctx, FaultAddress::User).unwrap();
    assert_eq!(fill.vpn, Vpn(2));
}

#[test]
fn test_address_error_consumes_no_frame() {
    let _env = setup();
    let mut mm = manager(4, 4);
    let space = mem_space(2);
    let ctx = FaultContext::new(Pid(1), &space);

    let err = mm
        .handle_tlb_miss(&ctx, FaultAddress::Kernel(Vaddr(2 * PAGE)))
        .unwrap_err();
    assert_eq!(err, VmError::AddressError { vaddr: Vaddr(2 * PAGE) });
    assert_eq!(err.severity(), Severity::ThreadFatal);
    assert_eq!(mm.ipt().resident(), 0);
    assert_eq!(mm.stats().tlb_misses, 0);
    assert!(mm.machine().tlb().iter().all(|e| !e.is_valid()));
}

#[test]
fn test_mmapped_page_beyond_bound_is_valid() {
    let _env = setup();
    let mut mm = manager(4, 4);
    let space = mem_space(2);
    let file = Arc::new(MemStore::from_bytes(&[9u8; PAGE]));
    space
        .add_mmap(MmapRegion::new(Vpn(10), Vpn(10), PAGE, PAGE, file).unwrap())
        .unwrap();
    let ctx = FaultContext::new(Pid(1), &space);

    let fill = mm
        .handle_tlb_miss(&ctx, FaultAddress::Kernel(Vaddr(10 * PAGE)))
        .unwrap();
    assert!(fill.paged_in);
    assert!(mm.machine().frame(fill.ppn).iter().all(|&b| b == 9));
}

#[test]
fn test_same_vpn_in_another_process_misses() {
    let _env = setup();
    let mut mm = manager(4, 4);
    let a = mem_space(4);
    let b = mem_space(4);

    let fa = mm
        .handle_tlb_miss(&FaultContext::new(Pid(1), &a), FaultAddress::Kernel(Vaddr(0)))
        .unwrap();
    mm.flush_tlb();
    let fb = mm
        .handle_tlb_miss(&FaultContext::new(Pid(2), &b), FaultAddress::Kernel(Vaddr(0)))
        .unwrap();

    assert!(fb.paged_in);
    assert_ne!(fa.ppn, fb.ppn);
    mm.verify().unwrap();
}

#[test]
fn test_short_swap_read_is_kernel_fatal() {
    let _env = setup();
    let mut mm = manager(4, 4);
    let (space, swap) = swap_space(4);
    swap.set_short_cap(Some(4));
    let ctx = FaultContext::new(Pid(1), &space);

    let err = mm
        .handle_tlb_miss(&ctx, FaultAddress::Kernel(Vaddr(PAGE)))
        .unwrap_err();
    assert_eq!(
        err,
        VmError::ShortTransfer {
            kind: BackingKind::Swap,
            offset: PAGE,
            expected: PAGE,
            actual: 4,
        }
    );
    assert_eq!(err.severity(), Severity::KernelFatal);
    assert_eq!(mm.ipt().resident(), 0);
    assert_eq!(mm.stats().page_faults, 0);
}

#[test]
fn test_region_larger_than_frame_is_rejected() {
    let _env = setup();
    let mut mm = manager(2, 2);
    let space = mem_space(2);
    // 按 64 字节页构造的区域，末页 37 字节放不进 16 字节的帧
    let file = Arc::new(MemStore::with_len(37));
    space
        .add_mmap(MmapRegion::new(Vpn(4), Vpn(4), 37, 64, file.clone()).unwrap())
        .unwrap();
    let ctx = FaultContext::new(Pid(1), &space);

    let err = mm
        .handle_tlb_miss(&ctx, FaultAddress::Kernel(Vaddr(4 * PAGE)))
        .unwrap_err();
    assert_eq!(err, VmError::InvalidRegion);
    assert_eq!(mm.ipt().resident(), 0);
    assert!(file.transfers().is_empty());
    mm.verify().unwrap();
}
