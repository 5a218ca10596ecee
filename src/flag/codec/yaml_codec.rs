use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

use super::core::{Codec, CodecError};

/// YAML 编解码器配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct YamlCodecConfig {}

/// YAML 编解码器
pub struct YamlCodec<T> {
    _phantom: PhantomData<T>,
}

impl<T> YamlCodec<T> {
    pub fn new(_config: YamlCodecConfig) -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<T> Codec<T> for YamlCodec<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    fn decode(&self, input: &[u8]) -> Result<T, CodecError> {
        serde_yaml::from_slice(input).map_err(|e| CodecError::Decode(e.to_string()))
    }

    fn encode(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        serde_yaml::to_string(value)
            .map(String::into_bytes)
            .map_err(|e| CodecError::Encode(e.to_string()))
    }

    fn name(&self) -> &'static str {
        "yaml"
    }
}

impl<T> From<YamlCodecConfig> for YamlCodec<T> {
    fn from(config: YamlCodecConfig) -> Self {
        YamlCodec::new(config)
    }
}

impl<T> From<Box<YamlCodec<T>>> for Box<dyn Codec<T>>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn from(source: Box<YamlCodec<T>>) -> Self {
        source as Box<dyn Codec<T>>
    }
}
