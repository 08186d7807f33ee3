// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::utils::errors::DispatchError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use validator::Validate;

const DEFAULT_MAX_REVIEWS: u32 = 20;
const DEFAULT_REVIEWS_SORT: &str = "newest";
const DEFAULT_ZOOM_LEVEL: u32 = 14;

/// 分发请求
///
/// 经过校验的入站抓取请求；`queries` 必须非空，否则在任何网络调用之前被拒绝
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, Validate)]
pub struct DispatchRequest {
    /// 查询列表，可以是逗号分隔的字符串或字符串数组
    #[serde(default, deserialize_with = "deserialize_queries")]
    #[validate(length(min = 1, message = "Queries are required for scraping."))]
    pub queries: Vec<String>,
    pub country: Option<String>,
    pub business_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_u32")]
    pub max_cities: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_lenient_bool")]
    pub randomize_cities: Option<bool>,
    pub api_key: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_bool")]
    pub enable_reviews_extraction: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_lenient_u32")]
    pub max_reviews: Option<u32>,
    pub reviews_sort: Option<String>,
    pub lang: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_u32")]
    pub max_results: Option<u32>,
    pub coordinates: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_u32")]
    pub zoom_level: Option<u32>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum QueriesInput {
    Text(String),
    List(Vec<String>),
}

fn deserialize_queries<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let input = Option::<QueriesInput>::deserialize(deserializer)?;
    Ok(match input {
        None => Vec::new(),
        Some(QueriesInput::Text(raw)) => split_queries(&raw),
        Some(QueriesInput::List(items)) => items
            .iter()
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .collect(),
    })
}

// Optional numeric and flag fields accept numbers, strings and bools alike.
// Values that cannot be read fall back to the backend default.
fn deserialize_lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(lenient_u32))
}

fn deserialize_lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(lenient_bool))
}

fn lenient_u32(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => match n.as_u64() {
            Some(n) => u32::try_from(n).ok(),
            None => n.as_f64().and_then(u32_from_f64),
        },
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u32>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(u32_from_f64))
        }
        _ => None,
    }
}

fn u32_from_f64(n: f64) -> Option<u32> {
    (n.is_finite() && n >= 0.0 && n <= u32::MAX as f64).then(|| n.round() as u32)
}

fn lenient_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|n| n != 0.0),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// 拆分逗号分隔的查询字符串，去除空白项
pub fn split_queries(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .collect()
}

impl DispatchRequest {
    /// 从原始JSON负载解析并校验
    ///
    /// # 返回值
    ///
    /// * `Ok(DispatchRequest)` - 校验通过的请求
    /// * `Err(DispatchError::Validation)` - 负载格式错误或缺少 `queries`
    pub fn parse(raw: Value) -> Result<Self, DispatchError> {
        if !raw.is_object() {
            return Err(DispatchError::Validation("Invalid payload".to_string()));
        }

        let request: DispatchRequest = serde_json::from_value(raw)
            .map_err(|e| DispatchError::Validation(format!("Invalid payload: {}", e)))?;
        request.ensure_valid()?;
        Ok(request)
    }

    /// 校验请求
    pub fn ensure_valid(&self) -> Result<(), DispatchError> {
        self.validate().map_err(|errors| {
            let message = errors
                .field_errors()
                .values()
                .flat_map(|errs| errs.iter())
                .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                .next()
                .unwrap_or_else(|| errors.to_string());
            DispatchError::Validation(message)
        })
    }

    /// 用于结果入库的查询标签
    pub fn query_label(&self) -> String {
        self.queries.join(", ")
    }

    /// 构建提交给后端的抓取输入，未设置的可选字段以 `null` 发送
    pub fn to_scrape_input(&self) -> Value {
        json!({
            "queries": self.queries,
            "country": self.country,
            "business_type": self.business_type,
            "max_cities": self.max_cities,
            "randomize_cities": self.randomize_cities.unwrap_or(true),
            "api_key": self.api_key,
            "enable_reviews_extraction": self.enable_reviews_extraction.unwrap_or(false),
            "max_reviews": self.max_reviews.unwrap_or(DEFAULT_MAX_REVIEWS),
            "reviews_sort": self.reviews_sort.as_deref().unwrap_or(DEFAULT_REVIEWS_SORT),
            "lang": self.lang,
            "max_results": self.max_results,
            "coordinates": self.coordinates,
            "zoom_level": self.zoom_level.unwrap_or(DEFAULT_ZOOM_LEVEL),
        })
    }
}
