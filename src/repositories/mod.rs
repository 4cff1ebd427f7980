//! # Repositories
//!
//! Database access for each resource. Repositories return `DbErr` so handlers
//! can map unique violations and missing rows to the right status codes.

use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::{ColumnTrait, Condition, EntityTrait, Order, QueryOrder, Select};

pub mod automation;
pub mod contact;
pub mod landing_page;
pub mod mastermind;
pub mod n8n_template;
pub mod news;
pub mod subscription;
pub mod tool;
pub mod waiting_list;

/// Case-insensitive "contains" match of `term` against any of `columns`.
/// `%` and `_` in the term match literally.
pub(crate) fn search_condition<C: ColumnTrait>(columns: &[C], term: &str) -> Condition {
    let pattern = format!("%{}%", escape_like(&term.to_lowercase()));
    columns.iter().fold(Condition::any(), |condition, column| {
        condition.add(
            Expr::expr(Func::lower(Expr::col(column.as_column_ref())))
                .like(LikeExpr::new(pattern.clone()).escape('\\')),
        )
    })
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Trimmed search term, or `None` when blank.
pub(crate) fn search_term(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|term| !term.is_empty())
}

pub(crate) fn apply_ordering<E: EntityTrait>(
    select: Select<E>,
    terms: Vec<(E::Column, Order)>,
) -> Select<E> {
    terms
        .into_iter()
        .fold(select, |select, (column, order)| select.order_by(column, order))
}
