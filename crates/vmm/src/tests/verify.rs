use super::*;
use crate::address::{Pid, Ppn, Vaddr, Vpn};
use crate::error::{Severity, VmError};
use crate::machine::TlbEntry;
use crate::manager::{FaultAddress, FaultContext};

fn loaded() -> MemoryManager {
    let mut mm = manager(4, 4);
    let space = mem_space(4);
    let ctx = FaultContext::new(Pid(1), &space);
    mm.handle_tlb_miss(&ctx, FaultAddress::Kernel(Vaddr(0))).unwrap();
    mm
}

fn what(result: Result<(), VmError>) -> &'static str {
    match result {
        Err(VmError::Inconsistent { what, .. }) => what,
        other => panic!("expected an inconsistency, got {:?}", other),
    }
}

#[test]
fn test_consistent_after_activity() {
    let _env = setup();
    assert!(manager(2, 2).verify().is_ok());
    assert!(loaded().verify().is_ok());
}

#[test]
fn test_slot_mapping_free_frame() {
    let _env = setup();
    let mut mm = loaded();
    mm.machine_mut().tlb_mut()[1] = TlbEntry::loaded(Vpn(3), Ppn(2), false);
    assert_eq!(what(mm.verify()), "TLB slot maps a free frame");
}

#[test]
fn test_duplicated_slot() {
    let _env = setup();
    let mut mm = loaded();
    let entry = mm.machine().tlb()[0];
    mm.machine_mut().tlb_mut()[1] = entry;
    assert_eq!(what(mm.verify()), "TLB slot is not referenced by its frame");
}

#[test]
fn test_stale_back_reference() {
    let _env = setup();
    let mut mm = loaded();
    mm.machine_mut().tlb_mut()[0].invalidate();
    let err = mm.verify().unwrap_err();
    assert_eq!(err.severity(), Severity::KernelFatal);
    assert_eq!(what(Err(err)), "frame back-reference names a stale slot");
}
