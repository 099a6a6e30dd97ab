//! 传感器通道
//!
//! 逐行文本流，每行一个十进制读数。读线程把行推入 crossbeam 通道，
//! 采集循环用 `recv_timeout` 轮询：超时不是错误，只是本轮没有数据。

use crate::{Result, TemplogError};
use crossbeam::channel::{bounded, Receiver, RecvTimeoutError};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::thread;
use std::time::Duration;

/// 读线程与采集循环之间的缓冲行数
const LINE_BUFFER: usize = 1024;

/// 单次轮询结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// 一行非空数据（已去除首尾空白）
    Payload(String),
    /// 超时内无数据
    Idle,
    /// 数据流已结束
    Closed,
}

/// 传感器数据源
pub trait SensorSource {
    fn next_payload(&mut self, timeout: Duration) -> TransportEvent;
}

/// 基于行的传感器通道（串口设备 / 命名管道 / 文件 / stdin）
pub struct LineTransport {
    name: String,
    receiver: Receiver<io::Result<String>>,
}

impl LineTransport {
    /// 打开传感器通道，`-` 表示标准输入
    pub fn open(path: &str) -> Result<Self> {
        if path == "-" {
            return Self::from_reader(BufReader::new(io::stdin()), "stdin");
        }

        let file = File::open(path).map_err(|e| {
            TemplogError::TransportUnavailable(format!("Failed to open port '{}': {}", path, e))
        })?;
        Self::from_reader(BufReader::new(file), path)
    }

    pub fn from_reader<R>(reader: R, name: impl Into<String>) -> Result<Self>
    where
        R: BufRead + Send + 'static,
    {
        let name = name.into();
        let (sender, receiver) = bounded(LINE_BUFFER);
        let thread_name = format!("sensor-reader[{}]", name);

        thread::Builder::new()
            .name(thread_name)
            .spawn(move || {
                for line in reader.lines() {
                    let fatal = matches!(&line, Err(e) if e.kind() != io::ErrorKind::InvalidData);
                    if sender.send(line).is_err() || fatal {
                        break;
                    }
                }
            })
            .map_err(|e| TemplogError::TransportUnavailable(format!("Failed to spawn reader thread: {}", e)))?;

        Ok(Self { name, receiver })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl SensorSource for LineTransport {
    fn next_payload(&mut self, timeout: Duration) -> TransportEvent {
        match self.receiver.recv_timeout(timeout) {
            Ok(Ok(line)) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    TransportEvent::Idle
                } else {
                    TransportEvent::Payload(trimmed.to_string())
                }
            }
            Ok(Err(e)) => {
                log::warn!("Read error on {}: {}", self.name, e);
                TransportEvent::Idle
            }
            Err(RecvTimeoutError::Timeout) => TransportEvent::Idle,
            Err(RecvTimeoutError::Disconnected) => TransportEvent::Closed,
        }
    }
}
