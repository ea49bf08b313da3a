use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::error::AppError;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum EmployeeStatus {
    Active,
    Inactive,
    Terminated,
}

/// A named line item of a salary structure (an allowance or a deduction).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({ "name": "Transport", "amount": 1500.0 }))]
pub struct SalaryComponent {
    pub name: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "basic": 30000.0,
        "hra": 5000.0,
        "allowances": [{ "name": "Transport", "amount": 1500.0 }],
        "deductions": [{ "name": "Provident Fund", "amount": 1800.0 }]
    })
)]
pub struct SalaryStructure {
    pub basic: f64,
    pub hra: f64,
    #[serde(default)]
    pub allowances: Vec<SalaryComponent>,
    #[serde(default)]
    pub deductions: Vec<SalaryComponent>,
}

impl SalaryStructure {
    pub fn total_allowances(&self) -> f64 {
        self.allowances.iter().map(|a| a.amount).sum()
    }

    pub fn total_deductions(&self) -> f64 {
        self.deductions.iter().map(|d| d.amount).sum()
    }

    /// Rejects non-finite or negative amounts and unnamed components.
    pub fn validate(&self) -> Result<(), AppError> {
        check_amount("basic", self.basic)?;
        check_amount("hra", self.hra)?;

        for (kind, items) in [("allowance", &self.allowances), ("deduction", &self.deductions)] {
            for item in items {
                if item.name.trim().is_empty() {
                    return Err(AppError::Validation(format!("{kind} name must not be empty")));
                }
                check_amount(&item.name, item.amount)?;
            }
        }

        Ok(())
    }
}

fn check_amount(field: &str, value: f64) -> Result<(), AppError> {
    if !value.is_finite() {
        return Err(AppError::Validation(format!("{field} must be a number")));
    }
    if value < 0.0 {
        return Err(AppError::Validation(format!("{field} cannot be negative")));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "employee_code": "EMP-001",
        "name": "John Doe",
        "department": "Engineering",
        "designation": "Engineer",
        "status": "ACTIVE",
        "salary_structure": {
            "basic": 30000.0,
            "hra": 5000.0,
            "allowances": [],
            "deductions": []
        }
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "EMP-001")]
    pub employee_code: String,

    #[schema(example = "John Doe")]
    pub name: String,

    #[schema(example = "Engineering")]
    pub department: String,

    #[schema(example = "Engineer")]
    pub designation: String,

    pub status: EmployeeStatus,

    pub salary_structure: SalaryStructure,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component(name: &str, amount: f64) -> SalaryComponent {
        SalaryComponent {
            name: name.to_string(),
            amount,
        }
    }

    #[test]
    fn totals_sum_each_list() {
        let s = SalaryStructure {
            basic: 100.0,
            hra: 10.0,
            allowances: vec![component("Transport", 15.5), component("Meal", 4.5)],
            deductions: vec![component("Tax", 12.0)],
        };
        assert_eq!(s.total_allowances(), 20.0);
        assert_eq!(s.total_deductions(), 12.0);
    }

    #[test]
    fn validate_rejects_negative_and_unnamed() {
        let mut s = SalaryStructure {
            basic: 100.0,
            ..Default::default()
        };
        assert!(s.validate().is_ok());

        s.hra = -1.0;
        assert!(matches!(s.validate(), Err(AppError::Validation(_))));

        s.hra = 0.0;
        s.deductions.push(component("  ", 5.0));
        assert!(matches!(s.validate(), Err(AppError::Validation(_))));

        s.deductions = vec![component("Tax", f64::NAN)];
        assert!(matches!(s.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn status_parses_uppercase() {
        assert_eq!("ACTIVE".parse::<EmployeeStatus>().ok(), Some(EmployeeStatus::Active));
        assert_eq!(EmployeeStatus::Terminated.to_string(), "TERMINATED");
        assert!("active".parse::<EmployeeStatus>().is_err());
    }
}
