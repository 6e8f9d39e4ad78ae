//! 校验提取器
//!
//! handler 只接收经过校验的类型化结构，原始输入不会越过这一层。

use super::{validate, Channel, Schema, ValidationError};
use crate::{error::AppError, middleware::AppState, schemas::Schemas};
use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Query, RawPathParams, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::{collections::HashMap, sync::Arc};

/// 请求结构与其编译后的 schema 的绑定
pub trait RequestSchema: DeserializeOwned {
    fn schema(schemas: &Schemas) -> &Schema;
}

/// 校验后的 JSON 请求体
#[derive(Debug, Clone)]
pub struct ValidJson<T>(pub T);

/// 校验后的路径参数
#[derive(Debug, Clone)]
pub struct ValidPath<T>(pub T);

/// 校验后的查询参数
#[derive(Debug, Clone)]
pub struct ValidQuery<T>(pub T);

impl<T> FromRequest<Arc<AppState>> for ValidJson<T>
where
    T: RequestSchema + Send,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await.map_err(|e| {
            tracing::debug!(error = %e, "Failed to read request body");
            ValidationError::request("unable to read request body")
        })?;

        // 空请求体按空对象处理，缺失字段由 schema 报告
        let raw = if bytes.iter().all(u8::is_ascii_whitespace) {
            Value::Object(Map::new())
        } else {
            serde_json::from_slice(&bytes)
                .map_err(|e| ValidationError::request(format!("malformed JSON: {}", e)))?
        };

        let output = validate(T::schema(&state.schemas), Channel::Body, &raw)?;
        into_typed(output).map(ValidJson)
    }
}

impl<T> FromRequestParts<Arc<AppState>> for ValidPath<T>
where
    T: RequestSchema + Send,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let params = RawPathParams::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::Internal(format!("path parameters unavailable: {}", e)))?;

        let raw: Map<String, Value> = params
            .iter()
            .map(|(key, value)| (key.to_string(), Value::String(value.to_string())))
            .collect();

        let output = validate(T::schema(&state.schemas), Channel::Params, &Value::Object(raw))?;
        into_typed(output).map(ValidPath)
    }
}

impl<T> FromRequestParts<Arc<AppState>> for ValidQuery<T>
where
    T: RequestSchema + Send,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Query(pairs) = Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
            .map_err(|_| ValidationError::request("malformed query string"))?;

        let raw: Map<String, Value> = pairs
            .into_iter()
            .map(|(key, value)| (key, Value::String(value)))
            .collect();

        let output = validate(T::schema(&state.schemas), Channel::Query, &Value::Object(raw))?;
        into_typed(output).map(ValidQuery)
    }
}

/// 校验通过的值袋转为目标结构
///
/// 失败说明 schema 与结构定义不一致，属于服务端故障。
fn into_typed<T: DeserializeOwned>(output: Map<String, Value>) -> Result<T, AppError> {
    serde_json::from_value(Value::Object(output)).map_err(|e| {
        AppError::Internal(format!(
            "validated input does not fit {}: {}",
            std::any::type_name::<T>(),
            e
        ))
    })
}
