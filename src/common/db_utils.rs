use std::collections::BTreeSet;

/// Se o erro for uma violação de unicidade, devolve o nome da restrição.
pub(crate) fn unique_violation(err: &sqlx::Error) -> Option<&str> {
    match err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            Some(db_err.constraint().unwrap_or_default())
        }
        _ => None,
    }
}

pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation())
}

/// IDs pedidos que não apareceram na consulta, em ordem crescente.
pub(crate) fn missing_ids(requested: &BTreeSet<i32>, found: &[i32]) -> Vec<i32> {
    let found: BTreeSet<i32> = found.iter().copied().collect();
    requested.difference(&found).copied().collect()
}
