//! Reference data loaded once per run: funds, expense classes, fiscal years

use crate::error::{common, ErrorExt, Result};
use crate::folio::{FolioApi, EXPENSE_CLASSES_PATH, FISCAL_YEARS_PATH, FUNDS_PATH};
use crate::model::{ExpenseClass, FiscalYear, Fund};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, info};

fn decode_all<T: DeserializeOwned>(records: Vec<Value>, what: &str) -> Result<Vec<T>> {
    records
        .into_iter()
        .map(|r| serde_json::from_value(r).to_reference_error(format!("malformed {} record", what)))
        .collect()
}

/// All funds of the tenant, indexed by code
#[derive(Debug, Clone, Default)]
pub struct FundIndex {
    by_code: HashMap<String, Fund>,
}

impl FundIndex {
    pub fn new(funds: Vec<Fund>) -> Self {
        Self {
            by_code: funds.into_iter().map(|f| (f.code.clone(), f)).collect(),
        }
    }

    pub async fn load(api: &dyn FolioApi) -> Result<Self> {
        let records = api.get_all(FUNDS_PATH, "funds", None).await?;
        let funds: Vec<Fund> = decode_all(records, "fund")?;
        info!("Loaded {} funds", funds.len());
        Ok(Self::new(funds))
    }

    pub fn get(&self, code: &str) -> Option<&Fund> {
        self.by_code.get(code)
    }

    /// Fail unless every code names an existing fund
    pub fn require_all<'a>(&self, codes: impl IntoIterator<Item = &'a str>) -> Result<()> {
        for code in codes {
            if !self.by_code.contains_key(code) {
                return Err(common::unknown_fund(code));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}

/// Expense classes indexed by id, code and name
#[derive(Debug, Clone, Default)]
pub struct ExpenseClassIndex {
    classes: Vec<ExpenseClass>,
    by_id: HashMap<String, usize>,
    by_code: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
}

impl ExpenseClassIndex {
    pub fn new(classes: Vec<ExpenseClass>) -> Self {
        let mut index = Self::default();
        for (i, class) in classes.iter().enumerate() {
            index.by_id.insert(class.id.clone(), i);
            index.by_code.insert(class.code.clone(), i);
            index.by_name.insert(class.name.clone(), i);
        }
        index.classes = classes;
        index
    }

    pub async fn load(api: &dyn FolioApi) -> Result<Self> {
        let records = api
            .get_all(EXPENSE_CLASSES_PATH, "expenseClasses", None)
            .await?;
        let classes: Vec<ExpenseClass> = decode_all(records, "expense class")?;
        info!("Loaded {} expense classes", classes.len());
        Ok(Self::new(classes))
    }

    pub fn by_id(&self, id: &str) -> Option<&ExpenseClass> {
        self.by_id.get(id).map(|&i| &self.classes[i])
    }

    pub fn by_code(&self, code: &str) -> Option<&ExpenseClass> {
        self.by_code.get(code).map(|&i| &self.classes[i])
    }

    pub fn by_name(&self, name: &str) -> Option<&ExpenseClass> {
        self.by_name.get(name).map(|&i| &self.classes[i])
    }

    /// Look up by code first, then by name
    pub fn resolve(&self, code_or_name: &str) -> Option<&ExpenseClass> {
        self.by_code(code_or_name).or_else(|| self.by_name(code_or_name))
    }

    pub fn all(&self) -> &[ExpenseClass] {
        &self.classes
    }
}

/// One `id<TAB>code<TAB>name` line per expense class
pub fn format_expense_classes(classes: &[ExpenseClass]) -> String {
    classes
        .iter()
        .map(|ec| format!("{}\t{}\t{}\n", ec.id, ec.code, ec.name))
        .collect()
}

/// Pick the fiscal year by code, or the one covering `today`
pub async fn find_fiscal_year(
    api: &dyn FolioApi,
    code: Option<&str>,
    today: NaiveDate,
) -> Result<FiscalYear> {
    let records = api
        .get_all(FISCAL_YEARS_PATH, "fiscalYears", None)
        .await?;
    let years: Vec<FiscalYear> = decode_all(records, "fiscal year")?;
    debug!("Considering {} fiscal years", years.len());

    let found = match code {
        Some(code) => years.into_iter().find(|fy| fy.code == code),
        None => years.into_iter().find(|fy| fy.covers(today)),
    };

    match (found, code) {
        (Some(fy), _) => {
            info!("Using fiscal year {} ({})", fy.code, fy.id);
            Ok(fy)
        }
        (None, Some(code)) => Err(common::no_fiscal_year(&format!("code '{}'", code))),
        (None, None) => Err(common::no_fiscal_year(&format!("date {}", today))),
    }
}
