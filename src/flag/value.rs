//! flag 值的统一抽象
//!
//! `FlagSet` 只通过 `FlagValue` 操作已注册的 flag，不关心其中存的具体类型

use std::any::Any;
use std::sync::Arc;

use super::error::FlagError;

/// 可注册到 `FlagSet` 的 flag 值
pub trait FlagValue: Send + Sync + 'static {
    /// 从字符串输入更新值
    fn set(&self, input: &str) -> Result<(), FlagError>;

    /// 检查输入能否被 `set` 接受，不修改当前值
    fn check(&self, input: &str) -> Result<(), FlagError>;

    /// 当前值的规范字符串表示
    fn string(&self) -> String;

    /// 类型标识，例如 "dyn_json"
    fn type_name(&self) -> &str;

    /// 是否支持启动后动态修改
    fn is_dynamic(&self) -> bool {
        false
    }

    /// 用于从 `Arc<dyn FlagValue>` 还原具体类型
    fn as_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}
