//! 传感器采集模块
//!
//! 单线程阻塞循环：读传感器（带超时）→ 解析 → 写 raw → 累加 → 检查窗口 → 清理过期数据

pub mod pipeline;
pub mod simulator;
pub mod transport;

pub use pipeline::{IngestPipeline, IngestStats};
pub use simulator::TemperatureWalk;
pub use transport::{LineTransport, SensorSource, TransportEvent};
