//! flag 模块 - 可在运行时动态更新的强类型配置
//!
//! - `DynValue<T>`：保存一个结构体值，读取无锁，`set` 时整体替换为新解析出的实例
//! - `Codec<T>`：可插拔的交换格式（JSON、JSON5、YAML、TOML）
//! - `FlagSet`：按名称注册、命令行解析、运行时更新
//!
//! 本模块只提供更新原语，配置从哪里来（文件、配置中心、管理接口）由调用方决定。

pub mod codec;
pub mod dyn_value;
pub mod error;
pub mod flag_set;
pub mod global;
pub mod static_value;
pub mod value;

// 重新导出公共 API
pub use codec::{
    register_codecs, Codec, CodecError, Json5Codec, Json5CodecConfig, JsonCodec, JsonCodecConfig,
    TomlCodec, TomlCodecConfig, YamlCodec, YamlCodecConfig,
};
pub use dyn_value::{DynValue, Notifier, Validator, RENDER_ERROR};
pub use error::FlagError;
pub use flag_set::{FlagInfo, FlagSet, FlagSetConfig};
pub use static_value::StaticValue;
pub use value::FlagValue;
