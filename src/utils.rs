//! 控制台日志与随机数等通用工具。

use rand::rngs::SmallRng;
use rand::SeedableRng;

/// 输出一条普通日志。浏览器中写入 `console.log`，本地环境写入 stderr。
pub fn log(message: &str) {
    #[cfg(target_arch = "wasm32")]
    {
        web_sys::console::log_1(&message.into());
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        eprintln!("[memory_match] {message}");
    }
}

/// 输出一条警告日志。
pub fn warn(message: &str) {
    #[cfg(target_arch = "wasm32")]
    {
        web_sys::console::warn_1(&message.into());
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        eprintln!("[memory_match] warning: {message}");
    }
}

/// 创建随机数生成器：给定种子时结果可复现，否则使用系统熵。
pub fn make_rng(seed: Option<u64>) -> SmallRng {
    match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn seeded_rng_is_reproducible() {
        let mut first = make_rng(Some(7));
        let mut second = make_rng(Some(7));
        let a: Vec<u32> = (0..8).map(|_| first.gen()).collect();
        let b: Vec<u32> = (0..8).map(|_| second.gen()).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn logging_does_not_panic_off_wasm() {
        log("hello");
        warn("careful");
    }
}
