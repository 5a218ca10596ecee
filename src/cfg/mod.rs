//! cfg 模块 - 配置管理
//!
//! 通过 `TypeOptions` 描述"用哪个实现 + 什么配置"，再由注册表构造出 trait object

pub mod registry;
pub mod type_options;

// 重新导出公共 API
pub use registry::{
    create_trait_from_type_options, generate_short_type_name, register_trait,
    register_validated_trait,
};
pub use type_options::TypeOptions;
