// TypeOptions 序列化相关实现

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// 类型选项结构
///
/// `type` 字段决定注册表中使用哪个实现，`options` 是该实现的配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TypeOptions {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub options: JsonValue,
}

impl TypeOptions {
    /// 仅指定类型名，options 为空对象
    pub fn of(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            options: JsonValue::Object(Default::default()),
        }
    }

    /// 从 JSON 字符串创建 TypeOptions（支持 JSON5 格式）
    pub fn from_json(json_str: &str) -> Result<Self> {
        Ok(json5::from_str(json_str)?)
    }

    /// 从 YAML 字符串创建 TypeOptions
    pub fn from_yaml(yaml_str: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml_str)?)
    }

    /// 从 TOML 字符串创建 TypeOptions
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_options_of() {
        let opts = TypeOptions::of("JsonCodec");
        assert_eq!(opts.type_name, "JsonCodec");
        assert!(opts.options.as_object().unwrap().is_empty());
    }

    #[test]
    fn test_json5_support() -> Result<()> {
        let json5_str = r#"
        {
            // 编解码器
            type: "JsonCodec",
            options: {
                indent: 4,   // 尾随逗号
            },
        }"#;

        let opts = TypeOptions::from_json(json5_str)?;
        assert_eq!(opts.type_name, "JsonCodec");
        assert_eq!(opts.options["indent"], 4);
        Ok(())
    }

    #[test]
    fn test_yaml_and_toml() -> Result<()> {
        let from_yaml = TypeOptions::from_yaml("type: YamlCodec\noptions: {}\n")?;
        let from_toml = TypeOptions::from_toml("type = \"YamlCodec\"\n[options]\n")?;
        assert_eq!(from_yaml, from_toml);
        Ok(())
    }

    #[test]
    fn test_missing_options_defaults_to_null() -> Result<()> {
        let opts = TypeOptions::from_json(r#"{"type": "TomlCodec"}"#)?;
        assert_eq!(opts.type_name, "TomlCodec");
        assert!(opts.options.is_null());
        Ok(())
    }

    #[test]
    fn test_invalid_json_error() {
        assert!(TypeOptions::from_json("{ type: ").is_err());
    }
}
