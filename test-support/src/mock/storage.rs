//! 后备存储的 Mock 实现
//!
//! [`MemStore`] 用一段内存模拟交换文件或被映射的文件，提供按偏移读写的最小语义，
//! 并记录每一次传输，便于断言传输的偏移与字节数。
//!
//! 注意：这里不依赖 `vmm` crate；`vmm` 在测试中为 `MemStore` 实现 `BackingStore`。

use std::sync::Mutex;

/// 传输方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOp {
    Read,
    Write,
}

/// 一次传输的记录
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    pub op: TransferOp,
    pub offset: usize,
    /// 请求的字节数
    pub requested: usize,
    /// 实际传输的字节数
    pub done: usize,
}

/// 内存后备存储
///
/// - 读取越过末尾时返回较少的字节（与普通文件一致）
/// - 写入越过末尾时自动扩展
/// - `short_cap`：限制单次传输的最大字节数，用于模拟传输不足
/// - `fail_errno`：让所有传输返回错误码
#[derive(Debug, Default)]
pub struct MemStore {
    data: Mutex<Vec<u8>>,
    log: Mutex<Vec<Transfer>>,
    short_cap: Mutex<Option<usize>>,
    fail_errno: Mutex<Option<isize>>,
}

impl MemStore {
    /// 创建一个空存储
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建一个长度为 `len` 的全零存储
    pub fn with_len(len: usize) -> Self {
        Self::from_bytes(&vec![0u8; len])
    }

    /// 以给定内容创建存储
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            data: Mutex::new(bytes.to_vec()),
            ..Self::default()
        }
    }

    /// 从 `offset` 读取到 `buf`，返回实际读取的字节数
    pub fn read_at(&self, offset: usize, buf: &mut [u8]) -> Result<usize, isize> {
        if let Some(errno) = *self.fail_errno.lock().unwrap() {
            return Err(errno);
        }
        let data = self.data.lock().unwrap();
        let mut n = data.len().saturating_sub(offset).min(buf.len());
        if let Some(cap) = *self.short_cap.lock().unwrap() {
            n = n.min(cap);
        }
        if n > 0 {
            buf[..n].copy_from_slice(&data[offset..offset + n]);
        }
        self.record(TransferOp::Read, offset, buf.len(), n);
        Ok(n)
    }

    /// 将 `buf` 写入 `offset`，返回实际写入的字节数
    pub fn write_at(&self, offset: usize, buf: &[u8]) -> Result<usize, isize> {
        if let Some(errno) = *self.fail_errno.lock().unwrap() {
            return Err(errno);
        }
        let mut n = buf.len();
        if let Some(cap) = *self.short_cap.lock().unwrap() {
            n = n.min(cap);
        }
        let mut data = self.data.lock().unwrap();
        if data.len() < offset + n {
            data.resize(offset + n, 0);
        }
        data[offset..offset + n].copy_from_slice(&buf[..n]);
        self.record(TransferOp::Write, offset, buf.len(), n);
        Ok(n)
    }

    /// 当前内容的拷贝
    pub fn contents(&self) -> Vec<u8> {
        self.data.lock().unwrap().clone()
    }

    /// 当前长度
    pub fn len(&self) -> usize {
        self.data.lock().unwrap().len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 限制单次传输的最大字节数（`None` 取消限制）
    pub fn set_short_cap(&self, cap: Option<usize>) {
        *self.short_cap.lock().unwrap() = cap;
    }

    /// 让后续传输返回错误码（`None` 恢复正常）
    pub fn set_fail(&self, errno: Option<isize>) {
        *self.fail_errno.lock().unwrap() = errno;
    }

    /// 所有传输记录
    pub fn transfers(&self) -> Vec<Transfer> {
        self.log.lock().unwrap().clone()
    }

    /// 指定方向的传输记录
    pub fn transfers_of(&self, op: TransferOp) -> Vec<Transfer> {
        self.transfers().into_iter().filter(|t| t.op == op).collect()
    }

    /// 清空传输记录
    pub fn clear_transfers(&self) {
        self.log.lock().unwrap().clear();
    }

    fn record(&self, op: TransferOp, offset: usize, requested: usize, done: usize) {
        self.log.lock().unwrap().push(Transfer {
            op,
            offset,
            requested,
            done,
        });
    }
}
