//! 窗口聚合模块
//!
//! 原始读数实时累加成小时/日均值
//!
//! 窗口相对进程启动时刻滚动（不按整点对齐），因此进程重启后窗口边界会变化。

pub mod aggregator;
pub mod window;

pub use aggregator::{Aggregator, WindowAggregate};
pub use window::WindowAccumulator;
