//! 可在运行时动态替换的结构体 flag
//!
//! 当前值保存在 `ArcSwap<T>` 中：读取无锁，更新时整体替换为新解码出的实例，
//! 已经拿到旧值的读者不会看到它被修改。

use anyhow::Result;
use arc_swap::{ArcSwap, ArcSwapOption};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::thread;

use crate::cfg::{create_trait_from_type_options, TypeOptions};

use super::codec::{Codec, CodecError, JsonCodec};
use super::error::FlagError;
use super::value::FlagValue;

/// 候选值校验函数，返回错误即拒绝本次更新
pub type Validator<T> = Box<dyn Fn(&T) -> Result<()> + Send + Sync>;

/// 更新通知函数，参数为 (旧值, 新值)
pub type Notifier<T> = Box<dyn Fn(Arc<T>, Arc<T>) + Send + Sync>;

const NOTIFIER_THREAD_NAME: &str = "flagx-notifier";

/// 编码失败时 `string` / `pretty_string` 返回的占位字符串
pub const RENDER_ERROR: &str = "ERR";

/// 动态结构体 flag
///
/// # 示例
/// ```
/// use flagx::flag::DynValue;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Serialize, Deserialize, PartialEq)]
/// struct Limits {
///     timeout: u64,
/// }
///
/// let limits = DynValue::new(Limits { timeout: 30 });
/// limits.with_validator(|v| {
///     anyhow::ensure!(v.timeout > 0, "timeout must be positive");
///     Ok(())
/// });
///
/// limits.set(r#"{"timeout": 60}"#).unwrap();
/// assert_eq!(limits.get().timeout, 60);
/// assert!(limits.set(r#"{"timeout": 0}"#).is_err());
/// assert_eq!(limits.get().timeout, 60);
/// ```
pub struct DynValue<T> {
    current: ArcSwap<T>,
    codec: Box<dyn Codec<T>>,
    type_name: String,
    validator: ArcSwapOption<Validator<T>>,
    notifier: ArcSwapOption<Notifier<T>>,
}

impl<T> DynValue<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// 使用 JSON 编解码器创建
    ///
    /// # Panics
    /// `default` 不是结构体（序列化后不是 map）时 panic。
    /// 单元结构体（`struct Empty;`）序列化为 null，无法与 `()` 区分，同样会 panic；
    /// 没有字段的配置请写成 `struct Empty {}`
    pub fn new(default: T) -> Self {
        Self::with_codec(default, Box::new(JsonCodec::<T>::default()))
    }

    /// 使用指定编解码器创建
    ///
    /// # Panics
    /// `default` 不是结构体（序列化后不是 map）时 panic，单元结构体同样不接受
    pub fn with_codec(default: T, codec: Box<dyn Codec<T>>) -> Self {
        assert_record(&default);
        let type_name = format!("dyn_{}", codec.name());
        Self {
            current: ArcSwap::from_pointee(default),
            codec,
            type_name,
            validator: ArcSwapOption::empty(),
            notifier: ArcSwapOption::empty(),
        }
    }

    /// 根据 `TypeOptions` 创建编解码器，需要先调用 `register_codecs::<T>()`
    ///
    /// # Panics
    /// `default` 不是结构体时 panic
    pub fn from_type_options(default: T, codec: &TypeOptions) -> Result<Self> {
        let codec: Box<dyn Codec<T>> = create_trait_from_type_options(codec)?;
        Ok(Self::with_codec(default, codec))
    }

    /// 获取当前值，不阻塞，可与 `set` 并发调用
    pub fn get(&self) -> Arc<T> {
        self.current.load_full()
    }

    /// 解析输入并替换当前值
    ///
    /// 解码或校验失败时返回错误，当前值不变，也不会触发通知
    pub fn set(&self, input: &str) -> Result<(), FlagError> {
        self.set_bytes(input.as_bytes())
    }

    /// 同 `set`，输入为原始字节
    pub fn set_bytes(&self, input: &[u8]) -> Result<(), FlagError> {
        let candidate = self.decode_checked(input)?;
        self.publish(candidate);
        Ok(())
    }

    // 解码并执行校验，不修改当前值
    fn decode_checked(&self, input: &[u8]) -> Result<T, FlagError> {
        let candidate = self.codec.decode(input)?;

        if let Some(validator) = self.validator.load().as_deref() {
            validator(&candidate).map_err(FlagError::Validation)?;
        }
        Ok(candidate)
    }

    fn publish(&self, candidate: T) {
        let new_value = Arc::new(candidate);
        let old_value = self.current.swap(Arc::clone(&new_value));

        if let Some(notifier) = self.notifier.load_full() {
            dispatch_notification(notifier, old_value, new_value);
        }
    }

    /// 设置校验函数，在 `set` 的调用线程上同步执行，重复设置会覆盖
    pub fn with_validator<F>(&self, validator: F) -> &Self
    where
        F: Fn(&T) -> Result<()> + Send + Sync + 'static,
    {
        self.validator
            .store(Some(Arc::new(Box::new(validator) as Validator<T>)));
        self
    }

    /// 使用 garde 的 `Validate` 作为校验函数
    pub fn with_garde_validation(&self) -> &Self
    where
        T: garde::Validate,
        <T as garde::Validate>::Context: Default,
    {
        self.with_validator(|value: &T| {
            value
                .validate()
                .map_err(|report| anyhow::anyhow!("{}", report))
        })
    }

    /// 设置通知函数，重复设置会覆盖
    ///
    /// 每次成功的 `set` 都会新起一个线程调用一次通知函数：
    /// - `set` 不等待通知完成，通知中的 panic 不会影响 `set`
    /// - 并发 `set` 时通知的先后顺序不保证与替换顺序一致
    /// - 没有数量上限，也不能取消；永不返回的通知函数会一直占用它的线程
    pub fn with_notifier<F>(&self, notifier: F) -> &Self
    where
        F: Fn(Arc<T>, Arc<T>) + Send + Sync + 'static,
    {
        self.notifier
            .store(Some(Arc::new(Box::new(notifier) as Notifier<T>)));
        self
    }

    /// 紧凑格式的当前值，编码失败返回 "ERR"
    pub fn string(&self) -> String {
        self.render(self.codec.encode(&self.get()))
    }

    /// 便于阅读的当前值，编码失败返回 "ERR"
    pub fn pretty_string(&self) -> String {
        self.render(self.codec.encode_pretty(&self.get()))
    }

    fn render(&self, encoded: Result<Vec<u8>, CodecError>) -> String {
        encoded
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .unwrap_or_else(|| RENDER_ERROR.to_string())
    }
}

fn assert_record<T: Serialize>(value: &T) {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::Object(_)) => {}
        Ok(other) => panic!(
            "DynValue value must be a struct, got {}",
            json_kind(&other)
        ),
        Err(e) => panic!("DynValue value must be a serializable struct: {}", e),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

fn dispatch_notification<T>(notifier: Arc<Notifier<T>>, old_value: Arc<T>, new_value: Arc<T>)
where
    T: Send + Sync + 'static,
{
    let spawned = thread::Builder::new()
        .name(NOTIFIER_THREAD_NAME.to_string())
        .spawn(move || (**notifier)(old_value, new_value));

    if let Err(e) = spawned {
        tracing::warn!(error = %e, "failed to spawn flag notifier thread");
    }
}

impl<T> FlagValue for DynValue<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn set(&self, input: &str) -> Result<(), FlagError> {
        DynValue::set(self, input)
    }

    fn check(&self, input: &str) -> Result<(), FlagError> {
        self.decode_checked(input.as_bytes()).map(|_| ())
    }

    fn string(&self) -> String {
        DynValue::string(self)
    }

    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn is_dynamic(&self) -> bool {
        true
    }

    fn as_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

impl<T> fmt::Display for DynValue<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.string())
    }
}

impl<T> fmt::Debug for DynValue<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynValue")
            .field("type_name", &self.type_name)
            .field("current", &self.string())
            .finish()
    }
}
