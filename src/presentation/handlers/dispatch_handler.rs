// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::gateway::{Accepted, DispatchGateway};
use crate::domain::models::outcome::DispatchRecord;
use crate::presentation::errors::AppError;
use crate::utils::errors::DispatchError;
use axum::{
    body::Bytes,
    extract::{Extension, Json, Path},
    http::StatusCode,
};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

/// 接受抓取请求
///
/// 校验通过后立即返回 202，抓取在后台工作器中执行
pub async fn start_task(
    Extension(gateway): Extension<Arc<DispatchGateway>>,
    body: Bytes,
) -> Result<(StatusCode, Json<Accepted>), AppError> {
    let payload = parse_payload(&body)?;
    let accepted = gateway.submit(payload).await?;
    Ok((StatusCode::ACCEPTED, Json(accepted)))
}

/// 查询分发状态
pub async fn get_task_status(
    Extension(gateway): Extension<Arc<DispatchGateway>>,
    Path(dispatch_id): Path<Uuid>,
) -> Result<Json<DispatchRecord>, AppError> {
    let record = gateway.status(dispatch_id)?;
    Ok(Json(record))
}

fn parse_payload(body: &[u8]) -> Result<Value, DispatchError> {
    let invalid = || DispatchError::Validation("Invalid payload".to_string());

    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(invalid());
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Null) | Err(_) => Err(invalid()),
        Ok(Value::Object(map)) if map.is_empty() => Err(invalid()),
        Ok(value) => Ok(value),
    }
}
