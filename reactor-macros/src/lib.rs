//! 反应堆过程宏（reactor-macros）
//!
//! - `#[entity]`：为具名字段结构体补齐 `id` 字段、合并默认派生，
//!   并实现 `::reactor_core::entity::Entity`。
//!
mod derive_utils;
mod entity;
mod field_utils;

use proc_macro::TokenStream;

/// 实体宏
/// - 若缺失则追加字段 `id: IdType`，并置于字段最前
/// - 默认派生 `Debug`、`Clone`、`serde::Serialize`、`serde::Deserialize`
/// - 自动实现 `::reactor_core::entity::Entity`（`Id`/`TYPE`/`id`）
/// - 支持参数：`#[entity(type = "Pet", id = u64, debug = false)]`
#[proc_macro_attribute]
pub fn entity(attr: TokenStream, item: TokenStream) -> TokenStream {
    entity::expand(attr, item)
}
