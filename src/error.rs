use thiserror::Error;

/// 持久层错误
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// 插入因唯一约束冲突被跳过，但重新查询仍看不到胜出的那一行
    #[error("{entity} {key} was neither found nor created")]
    Conflict { entity: &'static str, key: String },
}

/// 导入流程错误 (提取 + 入库)
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("malformed XML: {0}")]
    Parse(String),

    #[error("invalid date in {field}: {value:?}")]
    InvalidDate { field: &'static str, value: String },

    #[error("cannot convert {field} to a number: {value:?}")]
    NumericCoercion { field: &'static str, value: String },

    #[error("persistence error: {0}")]
    Persistence(#[from] StoreError),
}

impl ImportError {
    /// 稳定的错误分类标签，供调用方映射到传输层
    pub fn kind(&self) -> &'static str {
        match self {
            ImportError::Parse(_) => "ParseError",
            ImportError::InvalidDate { .. } => "InvalidDateError",
            ImportError::NumericCoercion { .. } => "NumericCoercionError",
            ImportError::Persistence(_) => "PersistenceError",
        }
    }
}

impl From<sqlx::Error> for ImportError {
    fn from(e: sqlx::Error) -> Self {
        ImportError::Persistence(StoreError::Database(e))
    }
}

impl From<quick_xml::Error> for ImportError {
    fn from(e: quick_xml::Error) -> Self {
        ImportError::Parse(e.to_string())
    }
}

pub type ImportResult<T> = Result<T, ImportError>;
pub type StoreResult<T> = Result<T, StoreError>;
