use super::*;
use crate::address::{Pid, Ppn, Vaddr, Vpn};
use crate::ipt::PageLookup;
use crate::machine::Access;
use crate::manager::{FaultAddress, FaultContext};

fn fault(mm: &mut MemoryManager, ctx: &FaultContext<'_>, vpn: usize) -> crate::manager::TlbFill {
    mm.handle_tlb_miss(ctx, FaultAddress::Kernel(Vaddr(vpn * PAGE)))
        .unwrap()
}

#[test]
fn test_free_slots_fill_in_order() {
    let _env = setup();
    let mut mm = manager(8, 4);
    let space = mem_space(8);
    let ctx = FaultContext::new(Pid(1), &space);

    for vpn in 0..4 {
        assert_eq!(fault(&mut mm, &ctx, vpn).slot, vpn);
    }
    assert_eq!(mm.fifo_cursor(), 0);
}

#[test]
fn test_full_tlb_evicts_each_slot_once_in_order() {
    let _env = setup();
    let mut mm = manager(8, 4);
    let space = mem_space(8);
    let ctx = FaultContext::new(Pid(1), &space);

    for vpn in 0..4 {
        fault(&mut mm, &ctx, vpn);
    }
    for vpn in 4..8 {
        let expected = vpn - 4;
        assert_eq!(mm.machine().tlb()[expected].vpn, Vpn(expected));
        assert_eq!(fault(&mut mm, &ctx, vpn).slot, expected);
        assert_eq!(mm.machine().tlb()[expected].vpn, Vpn(vpn));
        // 被替换的页仍然驻留，只是失去了 TLB 映射
        let old = mm.ipt().lookup(Pid(1), Vpn(expected)).unwrap();
        assert_eq!(mm.ipt().entry(old).tlb_slot(), None);
    }
    mm.verify().unwrap();
}

#[test]
fn test_eviction_writes_dirty_bit_back() {
    let _env = setup();
    let mut mm = manager(8, 1);
    let space = mem_space(8);
    let ctx = FaultContext::new(Pid(1), &space);

    let first = fault(&mut mm, &ctx, 0);
    assert!(mm.machine_mut().translate(Vaddr(3), Access::Write).is_some());
    assert!(!mm.ipt().entry(first.ppn).is_dirty());

    fault(&mut mm, &ctx, 1);
    let frame = mm.ipt().entry(first.ppn);
    assert!(frame.is_valid());
    assert!(frame.is_dirty());
    assert_eq!(frame.tlb_slot(), None);

    // 重新装入时沿用帧表中的脏位
    let again = fault(&mut mm, &ctx, 0);
    assert!(!again.paged_in);
    assert!(mm.machine().tlb()[again.slot].is_dirty());
    mm.verify().unwrap();
}

#[test]
fn test_cursor_follows_free_slot() {
    let _env = setup();
    let mut mm = manager(8, 4);
    let space = mem_space(8);
    let ctx = FaultContext::new(Pid(1), &space);

    for vpn in 0..4 {
        fault(&mut mm, &ctx, vpn);
    }
    mm.page_out(Ppn(2)).unwrap();
    assert!(!mm.machine().tlb()[2].is_valid());

    assert_eq!(fault(&mut mm, &ctx, 4).slot, 2);
    assert_eq!(mm.fifo_cursor(), 3);
    assert_eq!(fault(&mut mm, &ctx, 5).slot, 3);
    assert_eq!(mm.fifo_cursor(), 0);
}

#[test]
fn test_reinsert_never_duplicates_frame() {
    let _env = setup();
    let mut mm = manager(4, 2);
    let space = mem_space(4);
    let ctx = FaultContext::new(Pid(1), &space);

    let first = fault(&mut mm, &ctx, 0);
    let again = fault(&mut mm, &ctx, 0);
    assert_eq!(first.ppn, again.ppn);

    let mapped = mm
        .machine()
        .tlb()
        .iter()
        .filter(|e| e.is_valid() && e.ppn == first.ppn)
        .count();
    assert_eq!(mapped, 1);
    mm.verify().unwrap();
}
