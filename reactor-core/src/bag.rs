//! 无差别键访问的数据包（DataBag）
//!
//! 事件在队列两端传递的唯一载荷：
//! - 键统一规范化（去空白、ASCII 小写），`"Actor_Type"`、`"actor_type"` 视为同一个键；
//! - 任何实现 `BagKey` 的类型（字符串、字符、整数）都可作为键；
//! - 通过字节接口写入的字符串会先清洗掉非法 UTF-8 序列，保证可跨序列化边界传输。
//!
use crate::error::{ReactorError, ReactorResult};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::collections::btree_map;

/// 可作为数据包键的类型
pub trait BagKey {
    fn bag_key(&self) -> String;
}

impl BagKey for str {
    fn bag_key(&self) -> String {
        normalize_key(self)
    }
}

impl BagKey for String {
    fn bag_key(&self) -> String {
        normalize_key(self)
    }
}

impl BagKey for char {
    fn bag_key(&self) -> String {
        normalize_key(self.encode_utf8(&mut [0; 4]))
    }
}

impl<T: BagKey + ?Sized> BagKey for &T {
    fn bag_key(&self) -> String {
        (**self).bag_key()
    }
}

macro_rules! integer_bag_keys {
    ($($ty:ty),*) => {
        $(
            impl BagKey for $ty {
                fn bag_key(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

integer_bag_keys!(i32, i64, u32, u64, usize);

fn normalize_key(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

/// 清洗字节串：丢弃非法 UTF-8 序列，保留其余内容
pub fn sanitize(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        out.push_str(chunk.valid());
    }
    out
}

/// 真值判定：仅 `null` 与 `false` 为假
pub fn truthy(value: &Value) -> bool {
    !matches!(value, Value::Null | Value::Bool(false))
}

/// 空白判定：`null`、`false`、空白字符串与空集合
pub fn blank(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
        _ => false,
    }
}

/// 时间的传输形态：RFC 3339 字符串（UTC）
pub fn time_to_value(time: DateTime<Utc>) -> Value {
    Value::String(time.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

/// 解析时间：接受 RFC 3339 字符串或 Unix 秒（整数/小数），`null` 视为缺省
pub fn time_from_value(value: &Value) -> ReactorResult<Option<DateTime<Utc>>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => Ok(Some(DateTime::parse_from_rfc3339(s.trim())?.with_timezone(&Utc))),
        Value::Number(n) => {
            let parsed = if let Some(secs) = n.as_i64() {
                DateTime::from_timestamp(secs, 0)
            } else {
                n.as_f64().and_then(|f| {
                    let secs = f.floor();
                    let nanos = ((f - secs) * 1e9).round() as u32;
                    DateTime::from_timestamp(secs as i64, nanos.min(999_999_999))
                })
            };
            parsed.map(Some).ok_or_else(|| ReactorError::Parse {
                reason: format!("timestamp out of range: {n}"),
            })
        }
        other => Err(ReactorError::Parse {
            reason: format!("not a time: {other}"),
        }),
    }
}

/// 无差别键访问的数据包
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, Value>", into = "BTreeMap<String, Value>")]
pub struct DataBag(BTreeMap<String, Value>);

impl DataBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// 链式写入，便于构造选项
    pub fn with(mut self, key: impl BagKey, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// 写入一个值，返回旧值
    pub fn set(&mut self, key: impl BagKey, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.bag_key(), value.into())
    }

    /// 以字节写入字符串值，先清洗非法序列
    pub fn set_bytes(&mut self, key: impl BagKey, bytes: &[u8]) -> Option<Value> {
        self.set(key, Value::String(sanitize(bytes)))
    }

    pub fn set_time(&mut self, key: impl BagKey, time: DateTime<Utc>) -> Option<Value> {
        self.set(key, time_to_value(time))
    }

    pub fn get(&self, key: impl BagKey) -> Option<&Value> {
        self.0.get(&key.bag_key())
    }

    /// 读取非 `null` 的值
    pub fn present(&self, key: impl BagKey) -> Option<&Value> {
        self.get(key).filter(|v| !v.is_null())
    }

    pub fn get_str(&self, key: impl BagKey) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// 按真值语义读取
    pub fn is_truthy(&self, key: impl BagKey) -> bool {
        self.get(key).is_some_and(truthy)
    }

    /// 按空白语义读取（缺省视为空白）
    pub fn is_blank(&self, key: impl BagKey) -> bool {
        self.get(key).is_none_or(blank)
    }

    pub fn get_time(&self, key: impl BagKey) -> ReactorResult<Option<DateTime<Utc>>> {
        match self.get(key) {
            Some(value) => time_from_value(value),
            None => Ok(None),
        }
    }

    pub fn contains_key(&self, key: impl BagKey) -> bool {
        self.0.contains_key(&key.bag_key())
    }

    pub fn remove(&mut self, key: impl BagKey) -> Option<Value> {
        self.0.remove(&key.bag_key())
    }

    /// 合并另一个数据包，同名键以 `other` 为准
    pub fn merge(&mut self, other: DataBag) {
        self.0.extend(other.0);
    }

    /// 返回去除给定键后的副本
    pub fn without<K: BagKey>(&self, keys: &[K]) -> DataBag {
        let mut out = self.clone();
        for key in keys {
            out.remove(key);
        }
        out
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.0.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// 从线上字节反序列化：先清洗非法 UTF-8 再解析 JSON
    pub fn from_wire(bytes: &[u8]) -> ReactorResult<Self> {
        let text = sanitize(bytes);
        Ok(serde_json::from_str(&text)?)
    }

    pub fn to_wire(&self) -> ReactorResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

impl From<BTreeMap<String, Value>> for DataBag {
    fn from(raw: BTreeMap<String, Value>) -> Self {
        Self(
            raw.into_iter()
                .map(|(key, value)| (normalize_key(&key), value))
                .collect(),
        )
    }
}

impl From<DataBag> for BTreeMap<String, Value> {
    fn from(bag: DataBag) -> Self {
        bag.0
    }
}

impl<K: BagKey, V: Into<Value>> FromIterator<(K, V)> for DataBag {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut bag = DataBag::new();
        for (key, value) in iter {
            bag.set(key, value);
        }
        bag
    }
}

impl IntoIterator for DataBag {
    type Item = (String, Value);
    type IntoIter = btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a DataBag {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
