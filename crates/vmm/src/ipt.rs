//! 倒排页表
//!
//! 每个物理帧一项，记录占用该帧的 (进程, 虚拟页)、脏位、最近使用时刻、
//! 指向 TLB 槽位的反向引用，以及所有者地址空间（用于换出时定位后备存储）。
//!
//! ## 不变量
//!
//! - 有效帧恰有一个所有者 (pid, vpn)；同一进程的有效帧虚拟页互不相同
//! - 反向引用存在时，所指 TLB 槽位必须有效且正向映射回本帧
//!
//! 帧只在换入时变为有效、在换出时变为无效；TLB 替换只清除反向引用。

use crate::address::{Pid, Ppn, Vpn};
use crate::space::AddressSpace;
use alloc::sync::Arc;
use alloc::vec::Vec;

/// 一个物理帧的记录
#[derive(Debug, Clone, Default)]
pub struct FrameEntry {
    valid: bool,
    pid: Pid,
    vpn: Vpn,
    dirty: bool,
    last_used: u64,
    tlb_slot: Option<usize>,
    space: Option<Arc<AddressSpace>>,
}

impl FrameEntry {
    /// 帧是否被占用
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// 所有者进程
    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// 所有者虚拟页
    pub fn vpn(&self) -> Vpn {
        self.vpn
    }

    /// 帧表中记录的脏位（TLB 中可能有更新的值）
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// 最近一次装入 TLB 的时刻
    pub fn last_used(&self) -> u64 {
        self.last_used
    }

    /// 映射本帧的 TLB 槽位
    pub fn tlb_slot(&self) -> Option<usize> {
        self.tlb_slot
    }

    /// 所有者地址空间
    pub fn space(&self) -> Option<&Arc<AddressSpace>> {
        self.space.as_ref()
    }

    /// 是否属于 (pid, vpn)
    pub fn is_owned_by(&self, pid: Pid, vpn: Vpn) -> bool {
        self.valid && self.pid == pid && self.vpn == vpn
    }

    /// 换入完成后登记新的所有者
    ///
    /// 脏位清零、反向引用清空、最近使用时刻置 0。
    pub(crate) fn occupy(&mut self, pid: Pid, vpn: Vpn, space: Arc<AddressSpace>) {
        self.valid = true;
        self.pid = pid;
        self.vpn = vpn;
        self.dirty = false;
        self.tlb_slot = None;
        self.last_used = 0;
        self.space = Some(space);
    }

    /// 帧变为空闲，释放对所有者地址空间的引用
    pub(crate) fn release(&mut self) {
        self.valid = false;
        self.dirty = false;
        self.tlb_slot = None;
        self.space = None;
    }

    pub(crate) fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
    }

    pub(crate) fn set_tlb_slot(&mut self, slot: Option<usize>) {
        self.tlb_slot = slot;
    }

    pub(crate) fn take_tlb_slot(&mut self) -> Option<usize> {
        self.tlb_slot.take()
    }

    pub(crate) fn touch(&mut self, tick: u64) {
        self.last_used = tick;
    }
}

/// 按 (进程, 虚拟页) 查找驻留帧
///
/// 默认实现是线性扫描；替换为带索引的实现时调用者无需改动。
pub trait PageLookup {
    /// 属于 (pid, vpn) 的有效帧
    fn lookup(&self, pid: Pid, vpn: Vpn) -> Option<Ppn>;
}

/// 倒排页表，按帧号索引
#[derive(Debug)]
pub struct InvertedPageTable {
    frames: Vec<FrameEntry>,
}

impl InvertedPageTable {
    /// 创建 `num_frames` 个空闲帧
    pub fn new(num_frames: usize) -> Self {
        let mut frames = Vec::with_capacity(num_frames);
        frames.resize_with(num_frames, FrameEntry::default);
        Self { frames }
    }

    /// 帧数量
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// 是否没有任何帧
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// 帧记录
    pub fn entry(&self, ppn: Ppn) -> &FrameEntry {
        &self.frames[ppn.0]
    }

    pub(crate) fn entry_mut(&mut self, ppn: Ppn) -> &mut FrameEntry {
        &mut self.frames[ppn.0]
    }

    /// 按帧号遍历
    pub fn iter(&self) -> impl Iterator<Item = (Ppn, &FrameEntry)> {
        self.frames.iter().enumerate().map(|(i, e)| (Ppn(i), e))
    }

    /// 有效帧数量
    pub fn resident(&self) -> usize {
        self.frames.iter().filter(|e| e.valid).count()
    }

    /// 某进程拥有的有效帧
    pub fn frames_of(&self, pid: Pid) -> impl Iterator<Item = Ppn> + '_ {
        self.iter()
            .filter(move |(_, e)| e.valid && e.pid == pid)
            .map(|(ppn, _)| ppn)
    }

    /// 以 trace 级别输出整张表
    pub fn dump(&self) {
        for (ppn, e) in self.iter() {
            log::trace!(
                "IPT[{}] = pid[{}] vpn[{}] last used[{}] valid[{}] dirty[{}] tlb[{:?}]",
                ppn,
                e.pid,
                e.vpn,
                e.last_used,
                e.valid,
                e.dirty,
                e.tlb_slot
            );
        }
    }
}

impl PageLookup for InvertedPageTable {
    fn lookup(&self, pid: Pid, vpn: Vpn) -> Option<Ppn> {
        self.frames
            .iter()
            .position(|e| e.is_owned_by(pid, vpn))
            .map(Ppn)
    }
}
