// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

static FILENAME_EXTENDED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)filename\*\s*=\s*([^']*)'[^']*'([^;]+)"#).expect("valid regex")
});

static FILENAME_PLAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)filename\s*=\s*"?([^";]+)"?"#).expect("valid regex")
});

/// 规范化后端基础URL
///
/// 只保留 `scheme://host[:port]`，丢弃主机之后的任何路径。
/// 例如 `http://127.0.0.1:8000/api/` 变为 `http://127.0.0.1:8000`。
pub fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim();

    if let Ok(url) = Url::parse(trimmed) {
        if url.has_host() {
            return url.origin().ascii_serialization();
        }
    }

    // No scheme: keep everything up to the first slash after the host
    let (scheme, rest) = match trimmed.split_once("://") {
        Some((scheme, rest)) => (Some(scheme), rest),
        None => (None, trimmed),
    };
    let host = rest.split('/').next().unwrap_or(rest);

    match scheme {
        Some(scheme) => format!("{}://{}", scheme, host),
        None => host.to_string(),
    }
}

/// 拼接基础URL和相对路径
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// 从 `Content-Disposition` 头中提取文件名
///
/// 优先使用 `filename*=`（RFC 5987），其次 `filename=`。
/// 返回的文件名去除了任何目录部分。
pub fn filename_from_content_disposition(value: &str) -> Option<String> {
    let raw = if let Some(caps) = FILENAME_EXTENDED.captures(value) {
        let encoded = caps.get(2)?.as_str().trim();
        urlencoding::decode(encoded)
            .map(|decoded| decoded.into_owned())
            .unwrap_or_else(|_| encoded.to_string())
    } else {
        FILENAME_PLAIN.captures(value)?.get(1)?.as_str().trim().to_string()
    };

    let name = raw
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim()
        .to_string();

    if name.is_empty() || name == "." || name == ".." {
        None
    } else {
        Some(name)
    }
}
