use thiserror::Error;

use super::codec::CodecError;

/// flag 相关错误
///
/// `Decode` 与 `Validation` 是运行时可恢复错误，发生时 flag 的当前值保持不变
#[derive(Error, Debug)]
pub enum FlagError {
    #[error("{0}")]
    Decode(#[from] CodecError),
    #[error("validation failed: {0}")]
    Validation(anyhow::Error),
    #[error("parse failed: {0}")]
    Parse(String),
    #[error("flag not found: {0}")]
    FlagNotFound(String),
    #[error("flag already registered: {0}")]
    AlreadyRegistered(String),
    #[error("flag is not dynamic: {0}")]
    NotDynamic(String),
    #[error("invalid flag name \"{name}\": {reason}")]
    InvalidName { name: String, reason: &'static str },
    #[error("invalid argument \"{name}\": {source}")]
    InvalidArgument {
        name: String,
        #[source]
        source: Box<FlagError>,
    },
    #[error(transparent)]
    Args(#[from] clap::Error),
    #[error("configuration validation failed: {0}")]
    Config(String),
}

impl FlagError {
    /// 是否为"输入被拒绝"类错误（解码失败或校验失败）
    pub fn is_rejected_input(&self) -> bool {
        match self {
            FlagError::Decode(_) | FlagError::Validation(_) | FlagError::Parse(_) => true,
            FlagError::InvalidArgument { source, .. } => source.is_rejected_input(),
            _ => false,
        }
    }
}
