use garde::Validate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::core::{utf8_input, Codec, CodecError};
use super::json_codec::{JsonCodec, JsonCodecConfig, MAX_INDENT};

/// JSON5 编解码器配置
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Json5CodecConfig {
    /// 编码输出仍然是标准 JSON，这里复用 JSON 的缩进配置
    #[garde(custom(check_indent))]
    pub indent: Option<usize>,
}

fn check_indent(indent: &Option<usize>, _ctx: &()) -> garde::Result {
    match indent {
        Some(n) if *n > MAX_INDENT => Err(garde::Error::new(format!(
            "greater than {}",
            MAX_INDENT
        ))),
        _ => Ok(()),
    }
}

/// JSON5 编解码器
///
/// 解码接受注释、未加引号的键、尾随逗号等 JSON5 语法，适合手写的运维输入；
/// 编码输出标准 JSON（JSON 是 JSON5 的子集）
pub struct Json5Codec<T> {
    output: JsonCodec<T>,
}

impl<T> Json5Codec<T> {
    pub fn new(config: Json5CodecConfig) -> Self {
        let mut json_config = JsonCodecConfig::default();
        if let Some(indent) = config.indent {
            json_config.indent = indent;
        }
        Self {
            output: JsonCodec::new(json_config),
        }
    }
}

impl<T> Codec<T> for Json5Codec<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    fn decode(&self, input: &[u8]) -> Result<T, CodecError> {
        json5::from_str(utf8_input(input)?).map_err(|e| CodecError::Decode(e.to_string()))
    }

    fn encode(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        self.output.encode(value)
    }

    fn encode_pretty(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        self.output.encode_pretty(value)
    }

    fn name(&self) -> &'static str {
        "json5"
    }
}

impl<T> From<Json5CodecConfig> for Json5Codec<T> {
    fn from(config: Json5CodecConfig) -> Self {
        Json5Codec::new(config)
    }
}

impl<T> From<Box<Json5Codec<T>>> for Box<dyn Codec<T>>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn from(source: Box<Json5Codec<T>>) -> Self {
        source as Box<dyn Codec<T>>
    }
}
