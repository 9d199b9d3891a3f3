//! 关中断互斥锁
//!
//! [`IntrMutex`] 是 `lock_api::Mutex` 在 [`RawIntrLock`] 上的实例化，
//! 用于保护缺页处理路径上会被其它线程修改的共享数据（例如地址空间的 mmap 区域表）。

use crate::raw_intr_lock::RawIntrLock;

/// 持锁期间关闭中断的互斥锁。
///
/// # 示例
/// ```ignore
/// let regions = IntrMutex::new(Vec::new());
/// {
///     let mut guard = regions.lock(); // 关中断并加锁
///     guard.push(region);
/// } // 释放锁并恢复中断状态
/// ```
///
/// 不可重入：持锁期间再次对同一把锁调用 `lock` 会永远自旋。
pub type IntrMutex<T> = lock_api::Mutex<RawIntrLock, T>;
