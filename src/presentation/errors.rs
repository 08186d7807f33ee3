// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::utils::errors::DispatchError;

/// 应用错误类型
///
/// 封装所有可能的应用层错误，提供统一的错误处理接口
#[derive(Debug)]
pub struct AppError(anyhow::Error);

impl AppError {
    /// 对应的HTTP状态码
    pub fn status_code(&self) -> StatusCode {
        match self.0.downcast_ref::<DispatchError>() {
            Some(DispatchError::Validation(_)) => StatusCode::BAD_REQUEST,
            Some(DispatchError::QueueFull) | Some(DispatchError::QueueClosed) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Some(DispatchError::UnknownDispatch(_)) => StatusCode::NOT_FOUND,
            None => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // 校验错误直接返回原始信息
        let error_message = match self.0.downcast_ref::<DispatchError>() {
            Some(DispatchError::Validation(message)) => message.clone(),
            _ => self.0.to_string(),
        };

        if status.is_server_error() {
            error!(%status, error = %error_message, "Request failed");
        }

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
