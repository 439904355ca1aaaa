//! Budget upsert, occupation and the posting hook.

mod common;

use common::{cash_draft, date, setup};
use rust_decimal_macros::dec;
use tally_core::LedgerError;
use tally_core::budget::{BudgetControlConfig, BudgetKey, PostingBudgetRequest};
use tally_core::voucher::{VoucherDraft, VoucherStatus};
use tally_db::UpsertBudgetInput;
use tally_shared::types::{EntityId, TenantId};

fn key(entity_id: EntityId) -> BudgetKey {
    BudgetKey {
        entity_id,
        category: "marketing".into(),
        period_key: "2024-03".parse().unwrap(),
    }
}

fn upsert(entity_id: EntityId, amount: rust_decimal::Decimal) -> UpsertBudgetInput {
    UpsertBudgetInput {
        entity_id,
        category: "marketing".into(),
        period_key: "2024-03".parse().unwrap(),
        amount,
        control: None,
    }
}

fn with_budget(draft: VoucherDraft) -> VoucherDraft {
    VoucherDraft {
        budget_category: Some("marketing".into()),
        ..draft
    }
}

#[tokio::test]
async fn test_upsert_keeps_occupied_amount() {
    let repos = setup().await;
    let tenant = TenantId::new();
    let entity = EntityId::new();

    repos.budgets.upsert(tenant, upsert(entity, dec!(1000))).await.unwrap();
    repos.budgets.occupy(tenant, &key(entity), dec!(300)).await.unwrap();
    let budget = repos.budgets.upsert(tenant, upsert(entity, dec!(2000))).await.unwrap();

    assert_eq!(budget.amount, dec!(2000));
    assert_eq!(budget.occupied_amount, dec!(300));
    assert_eq!(budget.remaining, dec!(1700));

    let listed = repos.budgets.list(tenant, Some(entity), None).await.unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn test_enforced_occupation_beyond_budget_changes_nothing() {
    let repos = setup().await;
    let tenant = TenantId::new();
    let entity = EntityId::new();
    repos
        .budgets
        .upsert(
            tenant,
            UpsertBudgetInput {
                control: Some(BudgetControlConfig {
                    enforce_check: true,
                    auto_occupy: false,
                }),
                ..upsert(entity, dec!(1000))
            },
        )
        .await
        .unwrap();
    repos.budgets.occupy(tenant, &key(entity), dec!(800)).await.unwrap();

    let err = repos
        .budgets
        .occupy(tenant, &key(entity), dec!(300))
        .await
        .unwrap_err();
    match err {
        LedgerError::BudgetExceeded { remaining, requested, .. } => {
            assert_eq!(remaining, dec!(200));
            assert_eq!(requested, dec!(300));
        }
        other => panic!("expected BudgetExceeded, got {other:?}"),
    }

    let check = repos.budgets.check(tenant, &key(entity), dec!(300)).await.unwrap();
    assert!(!check.allowed);
    assert_eq!(check.occupied, dec!(800));
}

#[tokio::test]
async fn test_unenforced_occupation_may_overrun() {
    let repos = setup().await;
    let tenant = TenantId::new();
    let entity = EntityId::new();
    repos.budgets.upsert(tenant, upsert(entity, dec!(100))).await.unwrap();

    let budget = repos.budgets.occupy(tenant, &key(entity), dec!(150)).await.unwrap();
    assert_eq!(budget.remaining, dec!(-50));

    let budget = repos.budgets.release(tenant, &key(entity), dec!(500)).await.unwrap();
    assert_eq!(budget.occupied_amount, dec!(0));
}

#[tokio::test]
async fn test_missing_budget_is_an_error() {
    let repos = setup().await;
    let err = repos
        .budgets
        .check(TenantId::new(), &key(EntityId::new()), dec!(1))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::BudgetNotFound { .. }));
}

#[tokio::test]
async fn test_controls_round_trip() {
    let repos = setup().await;
    let tenant = TenantId::new();
    let entity = EntityId::new();
    let config = BudgetControlConfig {
        enforce_check: true,
        auto_occupy: true,
    };

    repos
        .budgets
        .upsert_control(tenant, entity, "marketing", config)
        .await
        .unwrap();
    let control = repos
        .budgets
        .get_control(tenant, entity, "marketing")
        .await
        .unwrap();
    assert_eq!(control.config, config);
    assert_eq!(repos.budgets.list_controls(tenant, None).await.unwrap().len(), 1);

    let err = repos
        .budgets
        .get_control(tenant, entity, "travel")
        .await
        .unwrap_err();
    assert_eq!(err.http_status_code(), 404);
}

#[tokio::test]
async fn test_posting_occupies_under_auto_occupy_control() {
    let repos = setup().await;
    let tenant = TenantId::new();
    let entity = EntityId::new();
    repos
        .budgets
        .upsert(
            tenant,
            UpsertBudgetInput {
                control: Some(BudgetControlConfig {
                    enforce_check: true,
                    auto_occupy: true,
                }),
                ..upsert(entity, dec!(150))
            },
        )
        .await
        .unwrap();

    let first = repos
        .vouchers
        .create_draft(tenant, with_budget(cash_draft(entity, date(2024, 3, 3), dec!(100))))
        .await
        .unwrap();
    repos
        .vouchers
        .transition(
            tenant,
            first.id,
            VoucherStatus::Posted,
            None,
            PostingBudgetRequest::default(),
        )
        .await
        .unwrap();
    let check = repos.budgets.check(tenant, &key(entity), dec!(1)).await.unwrap();
    assert_eq!(check.occupied, dec!(100));

    // The second posting does not fit: posting and occupation both fail.
    let second = repos
        .vouchers
        .create_draft(tenant, with_budget(cash_draft(entity, date(2024, 3, 4), dec!(80))))
        .await
        .unwrap();
    let err = repos
        .vouchers
        .transition(
            tenant,
            second.id,
            VoucherStatus::Posted,
            None,
            PostingBudgetRequest::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::BudgetExceeded { .. }));
    assert_eq!(
        repos.vouchers.get(tenant, second.id).await.unwrap().status,
        VoucherStatus::Draft
    );

    // Voiding the first posting releases its occupation.
    repos.vouchers.void(tenant, first.id, None).await.unwrap();
    let check = repos.budgets.check(tenant, &key(entity), dec!(1)).await.unwrap();
    assert_eq!(check.occupied, dec!(0));
}

#[tokio::test]
async fn test_caller_can_request_occupation_without_control() {
    let repos = setup().await;
    let tenant = TenantId::new();
    let entity = EntityId::new();
    repos.budgets.upsert(tenant, upsert(entity, dec!(500))).await.unwrap();

    let voucher = repos
        .vouchers
        .create_draft(tenant, with_budget(cash_draft(entity, date(2024, 3, 3), dec!(120))))
        .await
        .unwrap();
    repos
        .vouchers
        .transition(
            tenant,
            voucher.id,
            VoucherStatus::Posted,
            None,
            PostingBudgetRequest {
                check_budget: true,
                occupy_budget: true,
            },
        )
        .await
        .unwrap();

    let check = repos.budgets.check(tenant, &key(entity), dec!(1)).await.unwrap();
    assert_eq!(check.occupied, dec!(120));

    repos
        .vouchers
        .red_flush(tenant, voucher.id, None, None)
        .await
        .unwrap();
    let check = repos.budgets.check(tenant, &key(entity), dec!(1)).await.unwrap();
    assert_eq!(check.occupied, dec!(0));
}
