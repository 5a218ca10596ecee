use thiserror::Error;

/// 编解码相关错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("encode failed: {0}")]
    Encode(String),
    #[error("decode failed: {0}")]
    Decode(String),
}

/// 交换格式编解码器
///
/// 把一个具体的结构体类型 `T` 与一种文本/字节格式绑定在一起。
/// `DynValue` 只通过这个 trait 接触序列化，不关心具体格式。
pub trait Codec<T>: Send + Sync {
    /// 从字节解码出一个全新的 `T` 实例
    fn decode(&self, input: &[u8]) -> Result<T, CodecError>;

    /// 编码为紧凑格式
    fn encode(&self, value: &T) -> Result<Vec<u8>, CodecError>;

    /// 编码为便于阅读的格式，没有专门格式的编解码器直接复用 `encode`
    fn encode_pretty(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        self.encode(value)
    }

    /// 格式名称，例如 "json"
    fn name(&self) -> &'static str;
}

/// 解码前先转成 UTF-8 文本，供只接受 `&str` 的解析器使用
pub(crate) fn utf8_input(input: &[u8]) -> Result<&str, CodecError> {
    std::str::from_utf8(input).map_err(|e| CodecError::Decode(e.to_string()))
}
