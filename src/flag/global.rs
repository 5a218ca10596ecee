//! 进程级默认 FlagSet
//!
//! 库代码可以直接在这里注册 flag，`main` 中调用一次 `parse_env_args` 即可

use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

use super::dyn_value::DynValue;
use super::error::FlagError;
use super::flag_set::{FlagInfo, FlagSet, FlagSetConfig};
use super::value::FlagValue;

/// 全局 FlagSet，名称取自当前程序名
pub static FLAGS: Lazy<FlagSet> = Lazy::new(|| {
    let config = FlagSetConfig {
        name: program_name(),
        ..Default::default()
    };
    match FlagSet::new(config) {
        Ok(flags) => flags,
        Err(e) => panic!("failed to create global flag set: {}", e),
    }
});

fn program_name() -> String {
    std::env::args_os()
        .next()
        .as_deref()
        .and_then(|arg0| Path::new(arg0).file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| FlagSetConfig::default().name)
}

/// 在全局 FlagSet 中注册 JSON 动态 flag
///
/// # Panics
/// `default` 不是结构体，或 `name` 已被注册时 panic
pub fn dyn_json<T>(name: &str, default: T, usage: &str) -> Arc<DynValue<T>>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    FLAGS.dyn_json(name, default, usage)
}

pub fn set(name: &str, input: &str) -> Result<(), FlagError> {
    FLAGS.set(name, input)
}

pub fn lookup(name: &str) -> Option<Arc<dyn FlagValue>> {
    FLAGS.lookup(name)
}

pub fn describe() -> Vec<FlagInfo> {
    FLAGS.describe()
}

/// 解析当前进程的命令行参数
pub fn parse_env_args() -> Result<(), FlagError> {
    FLAGS.parse(std::env::args_os())
}
