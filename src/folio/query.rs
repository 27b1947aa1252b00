//! CQL query builders for the collection endpoints

/// Quote a value for use inside a CQL string literal
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if matches!(c, '"' | '\\' | '*' | '?' | '^') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

pub fn po_line_by_number(po_line_number: &str) -> String {
    format!("poLineNumber=={}", quote(po_line_number))
}

pub fn item_by_barcode(barcode: &str) -> String {
    format!("barcode=={}", quote(barcode))
}

/// Unreleased encumbrances created for a POL in one fiscal year
pub fn unreleased_encumbrances(po_line_id: &str, fiscal_year_id: &str) -> String {
    format!(
        "(encumbrance.sourcePoLineId=={} and fiscalYearId=={} and encumbrance.status==Unreleased)",
        quote(po_line_id),
        quote(fiscal_year_id)
    )
}

/// POLs with at least one distribution on the given fund code
pub fn po_lines_with_fund_code(code: &str) -> String {
    format!("fundDistribution =/@code {}", quote(code))
}

/// `field==v1 or field==v2 ...`, parenthesised
pub fn any_of(field: &str, values: &[String]) -> Option<String> {
    if values.is_empty() {
        return None;
    }
    let parts: Vec<String> = values
        .iter()
        .map(|v| format!("{}=={}", field, quote(v)))
        .collect();
    Some(format!("({})", parts.join(" or ")))
}

/// Join clauses with `and`, skipping absent ones
pub fn and_all<I>(clauses: I) -> String
where
    I: IntoIterator<Item = Option<String>>,
{
    clauses
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" and ")
}

/// Query that matches every record, sorted for stable paging
pub const ALL_RECORDS: &str = "cql.allRecords=1 sortBy id";
