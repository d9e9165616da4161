/// Implement [`FromRow`](crate::typed::FromRow) for a struct by matching its
/// fields to column labels.
///
/// A field reads the column with its own name unless a label is given with
/// `field = "label"`. Matching is case-sensitive, extra columns are ignored,
/// and `Option` fields tolerate a missing column.
///
/// ```rust
/// use chrono::NaiveDateTime;
/// use simple_db::impl_from_row;
///
/// struct Article {
///     id: i64,
///     title: String,
///     created_date: NaiveDateTime,
///     is_blind: bool,
///     body: Option<String>,
/// }
///
/// impl_from_row!(Article {
///     id,
///     title,
///     created_date = "createdDate",
///     is_blind = "isBlind",
///     body,
/// });
/// ```
#[macro_export]
macro_rules! impl_from_row {
    (@label $field:ident) => {
        stringify!($field)
    };
    (@label $field:ident, $label:literal) => {
        $label
    };
    ($ty:ident { $($field:ident $(= $label:literal)?),* $(,)? }) => {
        impl $crate::typed::FromRow for $ty {
            fn from_row(row: &$crate::Row) -> $crate::Result<Self> {
                Ok(Self {
                    $(
                        $field: row.try_get($crate::impl_from_row!(@label $field $(, $label)?))?,
                    )*
                })
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::SqlValue;
    use crate::error::SimpleDbError;
    use crate::test_utils::create_test_row;
    use crate::typed::FromRow;

    #[derive(Debug, PartialEq)]
    struct Member {
        id: i64,
        display_name: String,
        nickname: Option<String>,
    }

    crate::impl_from_row!(Member {
        id,
        display_name = "displayName",
        nickname,
    });

    #[test]
    fn fields_follow_labels_and_ignore_extra_columns() {
        let row = create_test_row(
            &["id", "displayName", "unused"],
            vec![SqlValue::Int(3), "Kim".into(), SqlValue::Bool(true)],
        );
        let member = Member::from_row(&row).unwrap();
        assert_eq!(
            member,
            Member {
                id: 3,
                display_name: "Kim".into(),
                nickname: None,
            }
        );
    }

    #[test]
    fn missing_required_field_fails() {
        let row = create_test_row(&["id", "display_name"], vec![SqlValue::Int(3), "Kim".into()]);
        let err = Member::from_row(&row).unwrap_err();
        assert!(
            matches!(err, SimpleDbError::ProjectionError { ref field, .. } if field == "displayName")
        );
    }
}
