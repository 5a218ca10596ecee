use garde::Validate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;
use std::marker::PhantomData;

use super::core::{Codec, CodecError};

/// JSON 编解码器配置
#[derive(Debug, Clone, Serialize, Deserialize, SmartDefault, Validate)]
#[serde(default)]
pub struct JsonCodecConfig {
    /// pretty 输出时每一级缩进的空格数
    #[default = 2]
    #[garde(range(max = 8))]
    pub indent: usize,
}

/// pretty 输出允许的最大缩进
pub const MAX_INDENT: usize = 8;

/// JSON 编解码器
pub struct JsonCodec<T> {
    indent: Vec<u8>,
    _phantom: PhantomData<T>,
}

impl<T> JsonCodec<T> {
    /// 配置校验失败时记录 warn，缩进按 `MAX_INDENT` 处理；需要拿到错误请用 `try_new`
    pub fn new(config: JsonCodecConfig) -> Self {
        match config.validate() {
            Ok(()) => Self::with_indent(config.indent),
            Err(report) => {
                tracing::warn!(
                    indent = config.indent,
                    error = %report,
                    "invalid json codec config, indent clamped to {}",
                    MAX_INDENT
                );
                Self::with_indent(MAX_INDENT)
            }
        }
    }

    pub fn try_new(config: JsonCodecConfig) -> Result<Self, garde::Report> {
        config.validate()?;
        Ok(Self::with_indent(config.indent))
    }

    fn with_indent(indent: usize) -> Self {
        Self {
            indent: vec![b' '; indent],
            _phantom: PhantomData,
        }
    }
}

impl<T> Default for JsonCodec<T> {
    fn default() -> Self {
        Self::new(JsonCodecConfig::default())
    }
}

impl<T> Codec<T> for JsonCodec<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    fn decode(&self, input: &[u8]) -> Result<T, CodecError> {
        serde_json::from_slice(input).map_err(|e| CodecError::Decode(e.to_string()))
    }

    fn encode(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(value).map_err(|e| CodecError::Encode(e.to_string()))
    }

    fn encode_pretty(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(&self.indent);
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        value
            .serialize(&mut serializer)
            .map_err(|e| CodecError::Encode(e.to_string()))?;
        Ok(buf)
    }

    fn name(&self) -> &'static str {
        "json"
    }
}

impl<T> From<JsonCodecConfig> for JsonCodec<T> {
    fn from(config: JsonCodecConfig) -> Self {
        JsonCodec::new(config)
    }
}

impl<T> From<Box<JsonCodec<T>>> for Box<dyn Codec<T>>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn from(source: Box<JsonCodec<T>>) -> Self {
        source as Box<dyn Codec<T>>
    }
}
