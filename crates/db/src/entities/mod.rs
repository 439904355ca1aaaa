//! `SeaORM` entity definitions.

pub mod budget_controls;
pub mod budget_occupations;
pub mod budgets;
pub mod cash_transactions;
pub mod periods;
pub mod sea_orm_active_enums;
pub mod voucher_lines;
pub mod voucher_sequences;
pub mod vouchers;
