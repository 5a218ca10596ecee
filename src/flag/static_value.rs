use arc_swap::ArcSwap;
use std::any::Any;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::cfg::generate_short_type_name;

use super::error::FlagError;
use super::value::FlagValue;

/// 普通（非动态）flag，值通过 `FromStr` 解析
///
/// 只能在 `FlagSet::parse` 完成之前修改，之后 `FlagSet::set` 会返回 `NotDynamic`
pub struct StaticValue<T> {
    current: ArcSwap<T>,
    type_name: String,
}

impl<T> StaticValue<T>
where
    T: FromStr + fmt::Display + Send + Sync + 'static,
    <T as FromStr>::Err: fmt::Display,
{
    pub fn new(default: T) -> Self {
        Self {
            current: ArcSwap::from_pointee(default),
            type_name: generate_short_type_name::<T>(),
        }
    }

    pub fn get(&self) -> Arc<T> {
        self.current.load_full()
    }
}

impl<T> FlagValue for StaticValue<T>
where
    T: FromStr + fmt::Display + Send + Sync + 'static,
    <T as FromStr>::Err: fmt::Display,
{
    fn set(&self, input: &str) -> Result<(), FlagError> {
        let value = parse_input::<T>(input)?;
        self.current.store(Arc::new(value));
        Ok(())
    }

    fn check(&self, input: &str) -> Result<(), FlagError> {
        parse_input::<T>(input).map(|_| ())
    }

    fn string(&self) -> String {
        self.get().to_string()
    }

    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn as_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

fn parse_input<T>(input: &str) -> Result<T, FlagError>
where
    T: FromStr,
    <T as FromStr>::Err: fmt::Display,
{
    input
        .parse::<T>()
        .map_err(|e| FlagError::Parse(e.to_string()))
}
