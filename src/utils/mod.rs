//! 工具模块

pub mod clock;
pub mod config;
