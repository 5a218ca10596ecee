// 类型注册表和工厂函数

use anyhow::{anyhow, Result};
use garde::Validate;
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::RwLock;

use super::type_options::TypeOptions;

// 返回的 Box<dyn Any> 里实际装的是 Box<dyn Trait>
type TraitConstructor = Box<dyn Fn(JsonValue) -> Result<Box<dyn Any + Send + Sync>> + Send + Sync>;

// 外层 key 是 Trait 的 TypeId，内层 key 是类型名称
static TRAIT_REGISTRY: Lazy<RwLock<HashMap<TypeId, HashMap<String, TraitConstructor>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// 为实现特定 Trait 的类型注册构造函数
///
/// 同一个 Trait 可以注册多个实现，运行时根据 `TypeOptions.type_name` 选择
///
/// # 类型参数
/// - `T`: 具体实现类型
/// - `Trait`: 目标 trait（使用 `dyn Trait` 形式）
/// - `Config`: 配置类型
///
/// # 示例
/// ```ignore
/// register_trait::<JsonCodec<Limits>, dyn Codec<Limits>, JsonCodecConfig>("JsonCodec")?;
///
/// let codec: Box<dyn Codec<Limits>> = create_trait_from_type_options(&type_options)?;
/// ```
pub fn register_trait<T, Trait, Config>(type_name: &str) -> Result<()>
where
    T: Send + Sync + 'static,
    Trait: ?Sized + Send + Sync + 'static,
    Config: DeserializeOwned + Send + Sync + 'static,
    T: From<Config>,
    Box<T>: Into<Box<Trait>>,
{
    let trait_id = TypeId::of::<Trait>();

    let constructor: TraitConstructor = Box::new(move |value| {
        let config: Config = serde_json::from_value(value)?;
        let trait_object: Box<Trait> = Box::new(T::from(config)).into();
        Ok(Box::new(trait_object) as Box<dyn Any + Send + Sync>)
    });

    let mut registry = TRAIT_REGISTRY
        .write()
        .map_err(|_| anyhow!("Failed to acquire write lock"))?;
    registry
        .entry(trait_id)
        .or_default()
        .insert(type_name.to_string(), constructor);

    Ok(())
}

/// 同 `register_trait`，构造前先用 garde 校验配置，校验失败时
/// `create_trait_from_type_options` 返回错误
pub fn register_validated_trait<T, Trait, Config>(type_name: &str) -> Result<()>
where
    T: Send + Sync + 'static,
    Trait: ?Sized + Send + Sync + 'static,
    Config: DeserializeOwned + Validate + Send + Sync + 'static,
    <Config as Validate>::Context: Default,
    T: From<Config>,
    Box<T>: Into<Box<Trait>>,
{
    let trait_id = TypeId::of::<Trait>();
    let name = type_name.to_string();

    let constructor: TraitConstructor = Box::new(move |value| {
        let config: Config = serde_json::from_value(value)?;
        config
            .validate()
            .map_err(|report| anyhow!("invalid options for '{}': {}", name, report))?;
        let trait_object: Box<Trait> = Box::new(T::from(config)).into();
        Ok(Box::new(trait_object) as Box<dyn Any + Send + Sync>)
    });

    let mut registry = TRAIT_REGISTRY
        .write()
        .map_err(|_| anyhow!("Failed to acquire write lock"))?;
    registry
        .entry(trait_id)
        .or_default()
        .insert(type_name.to_string(), constructor);

    Ok(())
}

/// 根据 TypeOptions 创建 trait object
///
/// `options` 为 null 时按空对象处理，配置类型的 `#[serde(default)]` 负责填充默认值
pub fn create_trait_from_type_options<Trait>(type_options: &TypeOptions) -> Result<Box<Trait>>
where
    Trait: ?Sized + Send + Sync + 'static,
{
    let trait_id = TypeId::of::<Trait>();
    let registry = TRAIT_REGISTRY
        .read()
        .map_err(|_| anyhow!("Failed to acquire read lock"))?;

    let constructor = registry
        .get(&trait_id)
        .ok_or_else(|| anyhow!("No implementations registered for trait"))?
        .get(&type_options.type_name)
        .ok_or_else(|| {
            anyhow!(
                "Type '{}' not registered for this trait",
                type_options.type_name
            )
        })?;

    let options = match &type_options.options {
        JsonValue::Null => JsonValue::Object(Default::default()),
        other => other.clone(),
    };

    constructor(options)?
        .downcast::<Box<Trait>>()
        .map(|boxed| *boxed)
        .map_err(|_| anyhow!("Failed to downcast to target trait type"))
}

/// 生成简短的类型名称，例如 `alloc::vec::Vec<alloc::string::String>` 简化为 `Vec<String>`
pub fn generate_short_type_name<T: ?Sized + 'static>() -> String {
    simplify_type_name(std::any::type_name::<T>())
}

fn simplify_type_name(full_name: &str) -> String {
    let mut out = String::with_capacity(full_name.len());
    let mut segment = String::new();

    for ch in full_name.chars() {
        match ch {
            '<' | '>' | ',' | ' ' | '(' | ')' | '[' | ']' | ';' | '&' => {
                out.push_str(last_path_segment(&segment));
                segment.clear();
                out.push(ch);
            }
            _ => segment.push(ch),
        }
    }
    out.push_str(last_path_segment(&segment));
    out
}

fn last_path_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}
