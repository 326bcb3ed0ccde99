use serde::Serialize;

/// A single-line edit: delete `delete_count` characters at `edit_column`,
/// then insert `insert_text` there. Columns are 1-based characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FixInfo {
    pub line_number: usize,
    pub edit_column: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insert_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete_count: Option<usize>,
}

/// Edit moving a line's first token from `actual_column` to `expected_column`.
///
/// Under-indented lines get the missing spaces inserted in front of the
/// token. Over-indented lines lose the excess from column 1, since everything
/// left of the token is indentation.
pub fn build_fix(line_number: usize, actual_column: usize, expected_column: usize) -> FixInfo {
    if expected_column > actual_column {
        FixInfo {
            line_number,
            edit_column: actual_column,
            insert_text: Some(" ".repeat(expected_column - actual_column)),
            delete_count: None,
        }
    } else {
        FixInfo {
            line_number,
            edit_column: 1,
            insert_text: None,
            delete_count: Some(actual_column - expected_column),
        }
    }
}
