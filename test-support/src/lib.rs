//! 测试支持 crate
//!
//! 提供宿主机测试使用的 Mock 实现：中断控制器与内存后备存储。
//! 本 crate 不依赖被测 crate（避免循环依赖），被测 crate 在测试中为这些类型实现自己的 trait。

pub mod mock;
