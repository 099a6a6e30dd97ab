//! 温度模拟器
//!
//! 向传感器通道（命名管道 / 虚拟串口 / 文件，`-` 为标准输出）持续写入随机游走温度，
//! 用于在没有真实传感器时测试采集进程。
//!
//! 运行: cargo run --bin templog-sim -- /tmp/templog.fifo --interval-ms 1000

use anyhow::{bail, Context};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::time::Duration;

use templog::ingest::TemperatureWalk;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    let mut target: Option<String> = None;
    let mut interval_ms: u64 = 1000;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--interval-ms" => {
                let value = args.get(i + 1).context("--interval-ms needs a value")?;
                interval_ms = value
                    .parse()
                    .with_context(|| format!("invalid --interval-ms {:?}", value))?;
                i += 1;
            }
            other => target = Some(other.to_string()),
        }
        i += 1;
    }

    let Some(target) = target else {
        bail!("Usage: templog-sim <port|-> [--interval-ms N]");
    };

    let mut out: Box<dyn Write> = if target == "-" {
        Box::new(io::stdout())
    } else {
        Box::new(
            OpenOptions::new()
                .append(true)
                .create(true)
                .open(&target)
                .with_context(|| format!("Failed to open port '{}'", target))?,
        )
    };

    log::info!("Writing simulated temperatures to {} every {}ms", target, interval_ms);

    let mut walk = TemperatureWalk::from_entropy();
    loop {
        let line = TemperatureWalk::<rand::rngs::StdRng>::format_line(walk.next_value());
        log::debug!("{}", line);
        writeln!(out, "{}", line).context("write failed")?;
        out.flush().context("flush failed")?;
        std::thread::sleep(Duration::from_millis(interval_ms));
    }
}
