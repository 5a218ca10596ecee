//! 交换格式编解码器
//!
//! `DynValue` 通过 `Codec<T>` 把输入解码成新的结构体实例，也通过它渲染当前值

pub mod core;
pub mod json5_codec;
pub mod json_codec;
pub mod register;
pub mod toml_codec;
pub mod yaml_codec;

pub use self::core::{Codec, CodecError};

pub use json5_codec::{Json5Codec, Json5CodecConfig};
pub use json_codec::{JsonCodec, JsonCodecConfig};
pub use toml_codec::{TomlCodec, TomlCodecConfig};
pub use yaml_codec::{YamlCodec, YamlCodecConfig};

pub use register::register_codecs;
