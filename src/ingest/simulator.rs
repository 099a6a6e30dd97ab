//! 温度模拟器
//!
//! 随机游走：起始值在 [-5, 17] 之间，每步 ±0.2

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// 默认步长
pub const DEFAULT_STEP: f64 = 0.2;

pub struct TemperatureWalk<R: Rng> {
    current: f64,
    step: f64,
    rng: R,
}

impl TemperatureWalk<StdRng> {
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> TemperatureWalk<R> {
    pub fn new(mut rng: R) -> Self {
        let current = f64::from(rng.gen_range(-5i32..=17));
        Self {
            current,
            step: DEFAULT_STEP,
            rng,
        }
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    /// 前进一步并返回新值
    pub fn next_value(&mut self) -> f64 {
        if self.rng.gen_bool(0.5) {
            self.current += self.step;
        } else {
            self.current -= self.step;
        }
        self.current
    }

    /// 传感器行格式（6 位小数）
    pub fn format_line(value: f64) -> String {
        format!("{:.6}", value)
    }
}
