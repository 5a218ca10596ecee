//! 命名 flag 集合
//!
//! 负责注册、命令行解析、帮助信息和运行时按名称更新。
//! 动态 flag（`is_dynamic() == true`）在解析完成后仍可通过 `set` 修改，普通 flag 不行。

use clap::{Arg, ArgAction, Command};
use garde::Validate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use super::codec::{Codec, JsonCodec};
use super::dyn_value::DynValue;
use super::error::FlagError;
use super::static_value::StaticValue;
use super::value::FlagValue;

// clap 自动生成的参数
const RESERVED_NAMES: &[&str] = &["help"];

/// FlagSet 配置
#[derive(Debug, Clone, Serialize, Deserialize, SmartDefault, Validate)]
#[serde(default)]
pub struct FlagSetConfig {
    /// 程序名，用于命令行解析和帮助信息
    #[default = "flagx"]
    #[garde(length(min = 1))]
    pub name: String,

    /// 帮助信息中的简介
    #[garde(skip)]
    pub about: String,
}

/// 单个 flag 的描述信息，可直接序列化输出到状态页
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlagInfo {
    pub name: String,
    pub usage: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub dynamic: bool,
    pub default: String,
    pub current: String,
}

struct FlagEntry {
    value: Arc<dyn FlagValue>,
    usage: String,
    default: String,
}

/// flag 集合
///
/// # 示例
/// ```
/// use flagx::flag::{FlagSet, FlagSetConfig};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Limits {
///     timeout: u64,
/// }
///
/// let flags = FlagSet::new(FlagSetConfig::default()).unwrap();
/// let limits = flags.dyn_json("limits", Limits { timeout: 30 }, "request limits");
///
/// flags.parse(["server", "--limits", r#"{"timeout": 10}"#]).unwrap();
/// assert_eq!(limits.get().timeout, 10);
///
/// flags.set("limits", r#"{"timeout": 20}"#).unwrap();
/// assert_eq!(limits.get().timeout, 20);
/// ```
pub struct FlagSet {
    name: String,
    about: String,
    flags: RwLock<BTreeMap<String, FlagEntry>>,
    parsed: AtomicBool,
}

impl FlagSet {
    pub fn new(config: FlagSetConfig) -> Result<Self, FlagError> {
        config
            .validate()
            .map_err(|e| FlagError::Config(e.to_string()))?;

        Ok(Self {
            name: config.name,
            about: config.about,
            flags: RwLock::new(BTreeMap::new()),
            parsed: AtomicBool::new(false),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 注册一个 flag，当前值作为默认值记录下来
    ///
    /// 名称不能为空，不能以 `-` 开头，不能包含 `=` 或空白，也不能是 `help`
    pub fn register(
        &self,
        name: &str,
        usage: &str,
        value: Arc<dyn FlagValue>,
    ) -> Result<(), FlagError> {
        check_name(name)?;

        let mut flags = self.flags.write().unwrap_or_else(PoisonError::into_inner);
        if flags.contains_key(name) {
            return Err(FlagError::AlreadyRegistered(name.to_string()));
        }

        let default = value.string();
        flags.insert(
            name.to_string(),
            FlagEntry {
                value,
                usage: usage.to_string(),
                default,
            },
        );
        Ok(())
    }

    /// 注册一个 JSON 格式的动态结构体 flag
    ///
    /// # Panics
    /// `default` 不是结构体，或 `name` 已被注册时 panic
    pub fn dyn_json<T>(&self, name: &str, default: T, usage: &str) -> Arc<DynValue<T>>
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        self.dyn_value(name, default, usage, Box::new(JsonCodec::<T>::default()))
    }

    /// 注册一个使用指定编解码器的动态结构体 flag
    ///
    /// # Panics
    /// `default` 不是结构体，或 `name` 已被注册时 panic
    pub fn dyn_value<T>(
        &self,
        name: &str,
        default: T,
        usage: &str,
        codec: Box<dyn Codec<T>>,
    ) -> Arc<DynValue<T>>
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        let value = Arc::new(DynValue::with_codec(default, codec));
        let flag: Arc<dyn FlagValue> = value.clone();
        self.must_register(name, usage, flag);
        value
    }

    /// 注册一个普通 flag
    ///
    /// # Panics
    /// `name` 已被注册时 panic
    pub fn static_value<T>(&self, name: &str, default: T, usage: &str) -> Arc<StaticValue<T>>
    where
        T: FromStr + fmt::Display + Send + Sync + 'static,
        <T as FromStr>::Err: fmt::Display,
    {
        let value = Arc::new(StaticValue::new(default));
        let flag: Arc<dyn FlagValue> = value.clone();
        self.must_register(name, usage, flag);
        value
    }

    fn must_register(&self, name: &str, usage: &str, value: Arc<dyn FlagValue>) {
        if let Err(e) = self.register(name, usage, value) {
            panic!("{}: {}", self.name, e);
        }
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<dyn FlagValue>> {
        self.flags
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .map(|entry| Arc::clone(&entry.value))
    }

    /// 按具体类型查找，例如 `lookup_as::<DynValue<Limits>>("limits")`
    pub fn lookup_as<V: FlagValue>(&self, name: &str) -> Option<Arc<V>> {
        self.lookup(name)?.as_any_arc().downcast::<V>().ok()
    }

    /// 按名称更新 flag
    ///
    /// 解析完成后只允许更新动态 flag
    pub fn set(&self, name: &str, input: &str) -> Result<(), FlagError> {
        let value = self
            .lookup(name)
            .ok_or_else(|| FlagError::FlagNotFound(name.to_string()))?;

        if self.is_parsed() && !value.is_dynamic() {
            return Err(FlagError::NotDynamic(name.to_string()));
        }

        match value.set(input) {
            Ok(()) => {
                tracing::info!(flag = name, value = %value.string(), "flag updated");
                Ok(())
            }
            Err(e) => {
                tracing::debug!(flag = name, error = %e, "flag update rejected");
                Err(e)
            }
        }
    }

    /// 解析命令行参数，`args` 的第一个元素是程序名
    ///
    /// 支持 `--name value` 和 `--name=value` 两种写法。
    /// `--help` 会以 `FlagError::Args` 返回，调用方可以用 `clap::Error::exit` 打印并退出。
    ///
    /// 所有参数先全部检查通过才会写入，任何一个出错时所有 flag 保持不变。
    /// 再次解析时普通 flag 已经冻结，出现在参数中会返回 `NotDynamic`。
    pub fn parse<I, S>(&self, args: I) -> Result<(), FlagError>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString> + Clone,
    {
        let matches = self.command().try_get_matches_from(args)?;
        let parsed = self.is_parsed();

        let mut pending = Vec::new();
        for (name, value) in self.snapshot() {
            // 构造命令之后才注册的 flag 不在 matches 中
            if let Some(input) = matches.try_get_one::<String>(&name).ok().flatten() {
                if parsed && !value.is_dynamic() {
                    return Err(FlagError::NotDynamic(name));
                }
                if let Err(e) = value.check(input) {
                    return Err(invalid_argument(name, e));
                }
                pending.push((name, value, input.clone()));
            }
        }

        for (name, value, input) in pending {
            value.set(&input).map_err(|e| invalid_argument(name.clone(), e))?;
            tracing::debug!(flag = %name, "flag set from command line");
        }

        self.parsed.store(true, Ordering::Release);
        Ok(())
    }

    pub fn is_parsed(&self) -> bool {
        self.parsed.load(Ordering::Acquire)
    }

    /// 根据已注册的 flag 构造 clap 命令
    pub fn command(&self) -> Command {
        let flags = self.flags.read().unwrap_or_else(PoisonError::into_inner);

        flags.iter().fold(
            Command::new(self.name.clone()).about(self.about.clone()),
            |command, (name, entry)| {
                command.arg(
                    Arg::new(name.clone())
                        .long(name.clone())
                        .value_name(entry.value.type_name().to_string())
                        .help(format!("{} (default {})", entry.usage, entry.default))
                        .action(ArgAction::Set),
                )
            },
        )
    }

    pub fn help(&self) -> String {
        self.command().render_help().to_string()
    }

    /// 所有 flag 的描述信息，按名称排序
    pub fn describe(&self) -> Vec<FlagInfo> {
        let flags = self.flags.read().unwrap_or_else(PoisonError::into_inner);
        flags
            .iter()
            .map(|(name, entry)| FlagInfo {
                name: name.clone(),
                usage: entry.usage.clone(),
                type_name: entry.value.type_name().to_string(),
                dynamic: entry.value.is_dynamic(),
                default: entry.default.clone(),
                current: entry.value.string(),
            })
            .collect()
    }

    /// 按名称顺序遍历所有 flag
    pub fn visit<F>(&self, mut visitor: F)
    where
        F: FnMut(&str, &dyn FlagValue),
    {
        for (name, value) in self.snapshot() {
            visitor(&name, value.as_ref());
        }
    }

    /// 按名称顺序遍历动态 flag
    pub fn visit_dynamic<F>(&self, mut visitor: F)
    where
        F: FnMut(&str, &dyn FlagValue),
    {
        self.visit(|name, value| {
            if value.is_dynamic() {
                visitor(name, value);
            }
        });
    }

    // 复制一份列表，回调和 set 执行期间不持有锁
    fn snapshot(&self) -> Vec<(String, Arc<dyn FlagValue>)> {
        self.flags
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(name, entry)| (name.clone(), Arc::clone(&entry.value)))
            .collect()
    }
}

fn check_name(name: &str) -> Result<(), FlagError> {
    let reason = if name.is_empty() {
        "must not be empty"
    } else if name.starts_with('-') {
        "must not start with '-'"
    } else if name.contains('=') || name.chars().any(char::is_whitespace) {
        "must not contain '=' or whitespace"
    } else if RESERVED_NAMES.contains(&name) {
        "reserved by the argument parser"
    } else {
        return Ok(());
    };

    Err(FlagError::InvalidName {
        name: name.to_string(),
        reason,
    })
}

fn invalid_argument(name: String, source: FlagError) -> FlagError {
    FlagError::InvalidArgument {
        name,
        source: Box::new(source),
    }
}

impl TryFrom<FlagSetConfig> for FlagSet {
    type Error = FlagError;

    fn try_from(config: FlagSetConfig) -> Result<Self, Self::Error> {
        FlagSet::new(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flag::codec::{Json5Codec, Json5CodecConfig};

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Limits {
        timeout: u64,
    }

    fn flag_set() -> FlagSet {
        FlagSet::new(FlagSetConfig {
            name: "server".to_string(),
            about: "test server".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_config_validation() {
        let err = FlagSet::new(FlagSetConfig {
            name: String::new(),
            about: String::new(),
        })
        .err()
        .unwrap();
        assert!(matches!(err, FlagError::Config(_)));

        let config: FlagSetConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.name, "flagx");
        assert!(FlagSet::try_from(config).is_ok());
    }

    #[test]
    fn test_register_duplicate() {
        let flags = flag_set();
        let value: Arc<dyn FlagValue> = Arc::new(DynValue::new(Limits { timeout: 1 }));
        flags.register("limits", "", Arc::clone(&value)).unwrap();

        let err = flags.register("limits", "", value).unwrap_err();
        assert!(matches!(err, FlagError::AlreadyRegistered(name) if name == "limits"));
    }

    #[test]
    #[should_panic(expected = "flag already registered: limits")]
    fn test_dyn_json_duplicate_panics() {
        let flags = flag_set();
        flags.dyn_json("limits", Limits { timeout: 1 }, "");
        flags.dyn_json("limits", Limits { timeout: 2 }, "");
    }

    #[test]
    fn test_set_and_lookup() {
        let flags = flag_set();
        let limits = flags.dyn_json("limits", Limits { timeout: 30 }, "request limits");

        flags.set("limits", r#"{"timeout": 60}"#).unwrap();
        assert_eq!(limits.get().timeout, 60);

        let found = flags.lookup_as::<DynValue<Limits>>("limits").unwrap();
        assert!(Arc::ptr_eq(&found, &limits));
        assert!(flags.lookup_as::<StaticValue<u16>>("limits").is_none());
    }

    #[test]
    fn test_set_unknown_flag() {
        let flags = flag_set();
        let err = flags.set("missing", "{}").unwrap_err();
        assert!(matches!(err, FlagError::FlagNotFound(_)));
    }

    #[test]
    fn test_static_flag_frozen_after_parse() {
        let flags = flag_set();
        let port = flags.static_value("port", 8080u16, "listen port");
        let limits = flags.dyn_json("limits", Limits { timeout: 30 }, "request limits");

        flags.set("port", "9000").unwrap();
        flags.parse(["server"]).unwrap();
        assert!(flags.is_parsed());
        assert_eq!(*port.get(), 9000);

        let err = flags.set("port", "9001").unwrap_err();
        assert!(matches!(err, FlagError::NotDynamic(_)));
        assert_eq!(*port.get(), 9000);

        flags.set("limits", r#"{"timeout": 5}"#).unwrap();
        assert_eq!(limits.get().timeout, 5);
    }

    #[test]
    fn test_parse_args() {
        let flags = flag_set();
        let port = flags.static_value("port", 8080u16, "listen port");
        let limits = flags.dyn_json("limits", Limits { timeout: 30 }, "request limits");

        flags
            .parse(["server", "--port=9090", "--limits", r#"{"timeout": 45}"#])
            .unwrap();

        assert_eq!(*port.get(), 9090);
        assert_eq!(limits.get().timeout, 45);
    }

    #[test]
    fn test_parse_invalid_value() {
        let flags = flag_set();
        let limits = flags.dyn_json("limits", Limits { timeout: 30 }, "request limits");

        let err = flags
            .parse(["server", "--limits", r#"{"timeout": "soon"}"#])
            .unwrap_err();
        assert!(matches!(&err, FlagError::InvalidArgument { name, .. } if name == "limits"));
        assert!(err.is_rejected_input());
        assert_eq!(limits.get().timeout, 30);
        assert!(!flags.is_parsed());
    }

    #[test]
    fn test_parse_all_or_nothing() {
        let flags = flag_set();
        let port = flags.static_value("port", 8080u16, "listen port");
        let limits = flags.dyn_json("limits", Limits { timeout: 30 }, "request limits");

        // "limits" 排在 "port" 前面，port 出错时 limits 也不能被修改
        let err = flags
            .parse(["server", "--limits", r#"{"timeout": 45}"#, "--port", "http"])
            .unwrap_err();
        assert!(matches!(&err, FlagError::InvalidArgument { name, .. } if name == "port"));
        assert_eq!(limits.get().timeout, 30);
        assert_eq!(*port.get(), 8080);
        assert!(!flags.is_parsed());
    }

    #[test]
    fn test_parse_again_keeps_static_frozen() {
        let flags = flag_set();
        let port = flags.static_value("port", 8080u16, "listen port");
        let limits = flags.dyn_json("limits", Limits { timeout: 30 }, "request limits");

        flags.parse(["server"]).unwrap();
        assert!(matches!(
            flags.set("port", "1").unwrap_err(),
            FlagError::NotDynamic(_)
        ));

        let err = flags
            .parse(["server", "--limits", r#"{"timeout": 45}"#, "--port", "1"])
            .unwrap_err();
        assert!(matches!(err, FlagError::NotDynamic(name) if name == "port"));
        assert_eq!(*port.get(), 8080);
        assert_eq!(limits.get().timeout, 30);

        flags.parse(["server", "--limits", r#"{"timeout": 45}"#]).unwrap();
        assert_eq!(limits.get().timeout, 45);
    }

    #[test]
    fn test_register_invalid_names() {
        let flags = flag_set();
        for name in ["", "help", "--limits", "a=b", "two words"] {
            let value: Arc<dyn FlagValue> = Arc::new(DynValue::new(Limits { timeout: 1 }));
            let err = flags.register(name, "", value).unwrap_err();
            assert!(matches!(err, FlagError::InvalidName { .. }), "{:?}", name);
        }
        assert!(flags.lookup("help").is_none());

        let err = flags.parse(["server", "--help"]).unwrap_err();
        assert!(
            matches!(&err, FlagError::Args(e) if e.kind() == clap::error::ErrorKind::DisplayHelp)
        );
    }

    #[test]
    #[should_panic(expected = "invalid flag name \"help\"")]
    fn test_dyn_json_reserved_name_panics() {
        let flags = flag_set();
        flags.dyn_json("help", Limits { timeout: 1 }, "");
    }

    #[test]
    fn test_parse_unknown_argument() {
        let flags = flag_set();
        flags.dyn_json("limits", Limits { timeout: 30 }, "request limits");

        let err = flags.parse(["server", "--unknown", "1"]).unwrap_err();
        assert!(matches!(err, FlagError::Args(_)));
    }

    #[test]
    fn test_help() {
        let flags = flag_set();
        flags.dyn_json("limits", Limits { timeout: 30 }, "request limits");
        flags.static_value("port", 8080u16, "listen port");

        let help = flags.help();
        assert!(help.contains("test server"));
        assert!(help.contains("--limits <dyn_json>"));
        assert!(help.contains(r#"request limits (default {"timeout":30})"#));
        assert!(help.contains("--port <u16>"));
    }

    #[test]
    fn test_describe() {
        let flags = flag_set();
        flags.static_value("port", 8080u16, "listen port");
        let codec = Json5Codec::<Limits>::new(Json5CodecConfig::default());
        flags.dyn_value("limits", Limits { timeout: 30 }, "request limits", Box::new(codec));
        flags.set("limits", "{ timeout: 10 }").unwrap();

        let infos = flags.describe();
        assert_eq!(infos.len(), 2);
        assert_eq!(
            infos[0],
            FlagInfo {
                name: "limits".to_string(),
                usage: "request limits".to_string(),
                type_name: "dyn_json5".to_string(),
                dynamic: true,
                default: r#"{"timeout":30}"#.to_string(),
                current: r#"{"timeout":10}"#.to_string(),
            }
        );
        assert_eq!(infos[1].name, "port");
        assert!(!infos[1].dynamic);

        let json = serde_json::to_value(&infos[1]).unwrap();
        assert_eq!(json["type"], "u16");
    }

    #[test]
    fn test_visit_dynamic() {
        let flags = flag_set();
        flags.static_value("port", 8080u16, "listen port");
        flags.dyn_json("b_limits", Limits { timeout: 1 }, "");
        flags.dyn_json("a_limits", Limits { timeout: 2 }, "");

        let mut all = Vec::new();
        flags.visit(|name, _| all.push(name.to_string()));
        assert_eq!(all, vec!["a_limits", "b_limits", "port"]);

        let mut dynamic = Vec::new();
        flags.visit_dynamic(|name, value| dynamic.push((name.to_string(), value.string())));
        assert_eq!(
            dynamic,
            vec![
                ("a_limits".to_string(), r#"{"timeout":2}"#.to_string()),
                ("b_limits".to_string(), r#"{"timeout":1}"#.to_string()),
            ]
        );
    }
}
