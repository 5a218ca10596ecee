use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

use super::core::{utf8_input, Codec, CodecError};

/// TOML 编解码器配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlCodecConfig {}

/// TOML 编解码器，只能承载顶层为表的结构体
pub struct TomlCodec<T> {
    _phantom: PhantomData<T>,
}

impl<T> TomlCodec<T> {
    pub fn new(_config: TomlCodecConfig) -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<T> Codec<T> for TomlCodec<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    fn decode(&self, input: &[u8]) -> Result<T, CodecError> {
        toml::from_str(utf8_input(input)?).map_err(|e| CodecError::Decode(e.to_string()))
    }

    fn encode(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        toml::to_string(value)
            .map(String::into_bytes)
            .map_err(|e| CodecError::Encode(e.to_string()))
    }

    fn encode_pretty(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        toml::to_string_pretty(value)
            .map(String::into_bytes)
            .map_err(|e| CodecError::Encode(e.to_string()))
    }

    fn name(&self) -> &'static str {
        "toml"
    }
}

impl<T> From<TomlCodecConfig> for TomlCodec<T> {
    fn from(config: TomlCodecConfig) -> Self {
        TomlCodec::new(config)
    }
}

impl<T> From<Box<TomlCodec<T>>> for Box<dyn Codec<T>>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn from(source: Box<TomlCodec<T>>) -> Self {
        source as Box<dyn Codec<T>>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Pool {
        size: u32,
        idle_secs: u64,
    }

    #[test]
    fn test_toml_codec() {
        let codec = TomlCodec::<Pool>::new(TomlCodecConfig::default());
        let pool = codec.decode(b"size = 16\nidle_secs = 30\n").unwrap();
        assert_eq!(pool, Pool { size: 16, idle_secs: 30 });

        let text = String::from_utf8(codec.encode(&pool).unwrap()).unwrap();
        assert!(text.contains("size = 16"));
    }

    #[test]
    fn test_toml_codec_rejects_json() {
        let codec = TomlCodec::<Pool>::new(TomlCodecConfig::default());
        assert!(codec.decode(br#"{"size": 1, "idle_secs": 2}"#).is_err());
    }
}
