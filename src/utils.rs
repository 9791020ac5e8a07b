//! 运行环境相关的小工具：panic hook、控制台日志、时钟。

/// 向浏览器控制台输出一行日志；非 wasm 目标下不产生任何调用。
#[macro_export]
macro_rules! log {
    ($($t:tt)*) => {
        $crate::utils::console_log(&format!($($t)*))
    };
}

#[cfg(target_arch = "wasm32")]
pub fn console_log(message: &str) {
    web_sys::console::log_1(&message.into());
}

#[cfg(not(target_arch = "wasm32"))]
pub fn console_log(_message: &str) {}

#[cfg(feature = "console_error_panic_hook")]
pub fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

#[cfg(not(feature = "console_error_panic_hook"))]
pub fn set_panic_hook() {}

/// 毫秒级时间戳。wasm 下取自 `Date.now()`。
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Instant {
    timestamp: f64,
}

impl Instant {
    pub fn now() -> Self {
        Self {
            timestamp: now_ms(),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        (now_ms() - self.timestamp).max(0.0) as u64
    }
}

#[cfg(target_arch = "wasm32")]
fn now_ms() -> f64 {
    web_sys::js_sys::Date::now()
}

#[cfg(not(target_arch = "wasm32"))]
fn now_ms() -> f64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}
