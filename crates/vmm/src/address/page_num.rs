//! 页码抽象模块
//!
//! 此模块定义了表示页码 (Page Number) 的 Trait 和具体的页码类型 (Ppn, Vpn)，
//! 以及 mmap 区域与批量换出使用的闭区间页码范围 (VpnRange)。

use super::Vaddr;
use core::fmt;

/// [PageNum] Trait
/// ---------------------
/// 页码与 usize 之间的转换，以及以页大小为单位的字节偏移计算。
pub trait PageNum: Copy + Clone + PartialEq + Eq + PartialOrd + Ord {
    /// 从 usize 构造页码
    fn from_usize(value: usize) -> Self;

    /// 获取页码数值
    fn as_usize(&self) -> usize;

    /// 该页第一个字节相对于 0 的偏移。
    ///
    /// 对 Vpn 而言这也是交换区中的偏移（交换区按 `vpn × page_size` 平铺）；
    /// 对 Ppn 而言这是主存中的偏移。
    fn byte_offset(self, page_size: usize) -> usize {
        self.as_usize() * page_size
    }

    /// 下一页
    fn next(self) -> Self {
        Self::from_usize(self.as_usize() + 1)
    }
}

/// `impl_page_num!` 宏
/// ---------------------
/// 为给定的 newtype 实现 `PageNum` 与 `Display`。
macro_rules! impl_page_num {
    ($type:ident) => {
        impl PageNum for $type {
            fn from_usize(value: usize) -> Self {
                Self(value)
            }

            fn as_usize(&self) -> usize {
                self.0
            }
        }

        impl fmt::Display for $type {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

/// [Ppn] (Physical Page Number)
/// ---------------------
/// 物理页码（帧号），同时也是倒排页表的下标。
#[repr(transparent)]
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub struct Ppn(pub usize);
impl_page_num!(Ppn);

/// [Vpn] (Virtual Page Number)
/// ---------------------
/// 虚拟页码。
#[repr(transparent)]
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash)]
pub struct Vpn(pub usize);
impl_page_num!(Vpn);

impl Vpn {
    /// 虚拟地址所在的页码（地址 ÷ 页大小）
    pub fn from_vaddr(vaddr: Vaddr, page_size: usize) -> Self {
        Vpn(vaddr.as_usize() / page_size)
    }
}

/// [VpnRange]
/// ---------------------
/// 闭区间 `[first, last]` 的虚拟页码范围。
///
/// mmap 区域记录的是首页和末页（末页可能只有部分字节属于文件），
/// 因此这里不使用半开区间。`first > last` 表示空范围。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VpnRange {
    first: Vpn,
    last: Vpn,
}

impl VpnRange {
    /// 创建闭区间 `[first, last]`
    pub const fn new(first: Vpn, last: Vpn) -> Self {
        Self { first, last }
    }

    /// 首页
    pub fn first(&self) -> Vpn {
        self.first
    }

    /// 末页（包含）
    pub fn last(&self) -> Vpn {
        self.last
    }

    /// 范围内的页数
    pub fn len(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            // 覆盖整个地址范围时饱和为 usize::MAX
            (self.last.0 - self.first.0).saturating_add(1)
        }
    }

    /// 是否为空范围
    pub fn is_empty(&self) -> bool {
        self.first > self.last
    }

    /// 是否包含给定页码
    pub fn contains(&self, vpn: Vpn) -> bool {
        vpn >= self.first && vpn <= self.last
    }

    /// 两个闭区间是否重叠
    pub fn overlaps(&self, other: &Self) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.first <= other.last
            && other.first <= self.last
    }

    /// 按升序遍历范围内的每个页码
    pub fn iter(&self) -> VpnRangeIter {
        VpnRangeIter {
            next: self.first,
            last: self.last,
            done: self.is_empty(),
        }
    }
}

impl IntoIterator for VpnRange {
    type Item = Vpn;
    type IntoIter = VpnRangeIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// [VpnRangeIter]
/// ---------------------
/// 闭区间页码范围的迭代器。
pub struct VpnRangeIter {
    next: Vpn,
    last: Vpn,
    done: bool,
}

impl Iterator for VpnRangeIter {
    type Item = Vpn;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let current = self.next;
        // 用 done 标志结束，避免 last == usize::MAX 时溢出
        if current == self.last {
            self.done = true;
        } else {
            self.next = current.next();
        }
        Some(current)
    }
}
