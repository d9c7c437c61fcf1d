// ==========================================
// 校服尺码分配系统 - 引擎层错误类型
// ==========================================
// 口径: 学生级失败以 FailureReason 记录,不走 Err;
//       Err 仅用于编程错误/配置错误,在类别边界被捕获并转为"该类别失败"
// ==========================================

use crate::config::Parity;
use crate::domain::size_ladder::LadderError;
use crate::domain::types::Gender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AllocationError {
    #[error("尺码序列错误: {0}")]
    Ladder(#[from] LadderError),

    #[error("上衣规则表缺少条目: gender={gender}, parity={parity:?}")]
    MissingRuleRow { gender: Gender, parity: Parity },

    #[error("配置加载失败: {0}")]
    Config(String),
}

pub type AllocationResult<T> = Result<T, AllocationError>;
