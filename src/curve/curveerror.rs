use thiserror::Error;

use crate::curve::coefficient::key::Key;
use crate::curve::curve::Time;

/// 曲線操作的錯誤分類。
///
/// - `PreconditionViolation`：呼叫端誤用（長度不一致、時間未嚴格遞增、重複時間），
///   操作一律不會被部分套用。
/// - `NotFound`：查詢超出曲線範圍或係數數量不足，曲線狀態不變。
/// - `Unimplemented`：該曲線變體不支援的操作。
#[derive(Debug, Error)]
pub enum CurveError {
    #[error("precondition violated: {0}")]
    PreconditionViolation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("not implemented: {0}")]
    Unimplemented(&'static str),

    #[error(transparent)]
    IOError(#[from] std::io::Error),

    #[error(transparent)]
    JsonParseError(#[from] serde_json::Error),

    #[error("unable to parse line {line}: {reason}")]
    ParseError {
        line: usize,
        reason: String
    }
}

impl CurveError {
    pub fn length_mismatch(times_len: usize, values_len: usize) -> CurveError {
        CurveError::PreconditionViolation(format!(
            "{} times given for {} values",
            times_len, values_len
        ))
    }

    pub fn time_already_present(time: Time) -> CurveError {
        CurveError::PreconditionViolation(format!("a coefficient already exists at time {}", time))
    }

    pub fn time_out_of_range(time: Time) -> CurveError {
        CurveError::NotFound(format!("unable to get the coefficients at time {}", time))
    }

    pub fn key_not_found(key: Key) -> CurveError {
        CurveError::NotFound(format!("key {} not found", key))
    }

    pub fn not_enough_coefficients(required: usize, available: usize) -> CurveError {
        CurveError::NotFound(format!(
            "{} coefficients required, curve holds {}",
            required, available
        ))
    }
}
