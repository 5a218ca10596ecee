//! flagx - 可在运行时动态更新的 flag
//!
//! 长时间运行的服务经常需要在不重启的情况下调整运维参数（超时、限流、开关等）。
//! flagx 把这类参数建模为一个强类型的结构体 flag：
//!
//! - 读取无锁，任何时刻都只会读到一个完整的值
//! - 更新时解析新的输入（默认 JSON），可选校验，校验通过后原子替换
//! - 替换成功后可选地异步通知
//!
//! ## 模块
//!
//! - **flag**: 动态 flag、编解码器、FlagSet
//! - **cfg**: TypeOptions 与类型注册表（按配置选择编解码器）
//!
//! ## 示例
//!
//! ```
//! use flagx::flag::global;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! struct Timeouts {
//!     read_ms: u64,
//!     write_ms: u64,
//! }
//!
//! let timeouts = global::dyn_json(
//!     "timeouts",
//!     Timeouts { read_ms: 500, write_ms: 1000 },
//!     "backend timeouts",
//! );
//!
//! // 管理接口或配置推送收到新值后调用
//! global::set("timeouts", r#"{"read_ms": 200, "write_ms": 800}"#).unwrap();
//! assert_eq!(timeouts.get().read_ms, 200);
//! ```

pub mod cfg;
pub mod flag;

// 重新导出主要的公共 API
pub use cfg::TypeOptions;

pub use flag::{
    Codec, CodecError, DynValue, FlagError, FlagInfo, FlagSet, FlagSetConfig, FlagValue,
    StaticValue,
};
