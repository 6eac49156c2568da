use thiserror::Error;

/// 配置與請求驗證錯誤
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("缺少必要配置項: {0}")]
    MissingField(String),

    #[error("無效的配置值: {0}")]
    InvalidValue(String),

    #[error("配置範圍錯誤: {field} 的值 {value} 不在範圍 {min}..{max} 內")]
    RangeError {
        field: String,
        value: String,
        min: String,
        max: String,
    },

    #[error("依賴錯誤: {dependent} 依賴於 {dependency} 的配置")]
    DependencyError {
        dependent: String,
        dependency: String,
    },

    #[error("總配置比例必須等於 100%，實際為 {total}% (基金: {funds}%, 比特幣: {bitcoin}%)")]
    AllocationTotal {
        total: String,
        funds: String,
        bitcoin: String,
    },
}

/// 可自我驗證的配置區段或請求
pub trait Validator {
    fn validate(&self) -> Result<(), ValidationError>;
}

/// 驗證實現了 [`Validator`] 的配置或請求
pub fn validate_config<T>(config: &T) -> Result<(), ValidationError>
where
    T: Validator,
{
    config.validate()
}

/// 配置與請求共用的驗證輔助函數
pub struct ValidationUtils;

impl ValidationUtils {
    /// 值必須落在 [min, max]（含兩端）
    pub fn in_range<T>(value: T, min: T, max: T, field_name: &str) -> Result<(), ValidationError>
    where
        T: PartialOrd + ToString,
    {
        if value < min || value > max {
            return Err(ValidationError::RangeError {
                field: field_name.to_string(),
                value: value.to_string(),
                min: min.to_string(),
                max: max.to_string(),
            });
        }
        Ok(())
    }

    /// 驗證數值嚴格大於零
    pub fn positive<T>(value: T, zero: T, field_name: &str) -> Result<(), ValidationError>
    where
        T: PartialOrd + ToString,
    {
        if value <= zero {
            return Err(ValidationError::InvalidValue(format!(
                "{} 必須大於 0，實際為 {}",
                field_name,
                value.to_string()
            )));
        }
        Ok(())
    }

    /// 值必須屬於允許的選項之一
    pub fn one_of<T>(value: &T, options: &[T], field_name: &str) -> Result<(), ValidationError>
    where
        T: PartialEq + ToString,
    {
        if !options.contains(value) {
            return Err(ValidationError::InvalidValue(format!(
                "{} 的值 {} 不是有效選項: {:?}",
                field_name,
                value.to_string(),
                options.iter().map(ToString::to_string).collect::<Vec<_>>()
            )));
        }
        Ok(())
    }

    /// 檢查必要的字串欄位是否有值
    pub fn not_empty(value: &str, field_name: &str) -> Result<(), ValidationError> {
        if value.trim().is_empty() {
            return Err(ValidationError::MissingField(field_name.to_string()));
        }
        Ok(())
    }

    /// 啟用某欄位時，其依賴欄位也必須有效
    pub fn check_dependency(
        has_dependent: bool,
        has_dependency: bool,
        dependent_name: &str,
        dependency_name: &str,
    ) -> Result<(), ValidationError> {
        if has_dependent && !has_dependency {
            return Err(ValidationError::DependencyError {
                dependent: dependent_name.to_string(),
                dependency: dependency_name.to_string(),
            });
        }
        Ok(())
    }
}
