use anyhow::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cfg::{register_trait, register_validated_trait};

use super::{
    Codec, Json5Codec, Json5CodecConfig, JsonCodec, JsonCodecConfig, TomlCodec, TomlCodecConfig,
    YamlCodec, YamlCodecConfig,
};

/// 为结构体类型 `T` 注册全部内置编解码器
///
/// 注册后可以通过 `TypeOptions` 按名称创建 `Box<dyn Codec<T>>`：
/// `JsonCodec`、`Json5Codec`、`YamlCodec`、`TomlCodec`
///
/// # 示例
/// ```ignore
/// register_codecs::<Limits>()?;
/// let codec: Box<dyn Codec<Limits>> =
///     create_trait_from_type_options(&TypeOptions::from_json(r#"{ type: "YamlCodec" }"#)?)?;
/// ```
pub fn register_codecs<T>() -> Result<()>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    register_validated_trait::<JsonCodec<T>, dyn Codec<T>, JsonCodecConfig>("JsonCodec")?;
    register_validated_trait::<Json5Codec<T>, dyn Codec<T>, Json5CodecConfig>("Json5Codec")?;
    register_trait::<YamlCodec<T>, dyn Codec<T>, YamlCodecConfig>("YamlCodec")?;
    register_trait::<TomlCodec<T>, dyn Codec<T>, TomlCodecConfig>("TomlCodec")?;
    Ok(())
}
