//! Ledger queries and consolidation.

mod common;

use std::collections::HashSet;

use common::{Repos, cash_draft, date, setup};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tally_core::LedgerError;
use tally_core::budget::PostingBudgetRequest;
use tally_core::ledger::{GroupBy, LedgerFilter};
use tally_core::voucher::{Voucher, VoucherStatus};
use tally_db::ConsolidationRequest;
use tally_shared::types::{EntityId, TenantId};
use tokio_util::sync::CancellationToken;

async fn posted(repos: &Repos, tenant: TenantId, entity: EntityId, day: u32, amount: Decimal) -> Voucher {
    let draft = repos
        .vouchers
        .create_draft(tenant, cash_draft(entity, date(2024, 3, day), amount))
        .await
        .unwrap();
    repos
        .vouchers
        .transition(
            tenant,
            draft.id,
            VoucherStatus::Posted,
            None,
            PostingBudgetRequest::default(),
        )
        .await
        .unwrap()
}

fn request(group_by: GroupBy, cursor: Option<EntityId>) -> ConsolidationRequest {
    ConsolidationRequest {
        period_key: "2024-03".parse().unwrap(),
        group_by,
        cursor,
        limit: None,
    }
}

#[tokio::test]
async fn test_balances_match_signed_entries() {
    let repos = setup().await;
    let tenant = TenantId::new();
    let entity = EntityId::new();
    posted(&repos, tenant, entity, 1, dec!(100)).await;
    posted(&repos, tenant, entity, 2, dec!(40)).await;

    let filter = LedgerFilter {
        account_code: Some("1001".into()),
        ..LedgerFilter::default()
    };
    let entries = repos.ledger.entries(tenant, filter.clone()).await.unwrap();
    let balances = repos.ledger.balances(tenant, filter).await.unwrap();

    let signed: Decimal = entries.iter().map(|e| e.signed_amount()).sum();
    assert_eq!(entries.len(), 2);
    assert_eq!(balances.len(), 1);
    assert_eq!(balances[0].balance, signed);
    assert_eq!(balances[0].balance, dec!(140));
    assert_eq!(balances[0].debit_total, dec!(140));
}

#[tokio::test]
async fn test_entries_are_in_date_order() {
    let repos = setup().await;
    let tenant = TenantId::new();
    let entity = EntityId::new();
    posted(&repos, tenant, entity, 20, dec!(1)).await;
    posted(&repos, tenant, entity, 3, dec!(2)).await;

    let entries = repos.ledger.entries(tenant, LedgerFilter::default()).await.unwrap();
    let dates: Vec<_> = entries.iter().map(|e| e.business_date).collect();
    assert_eq!(
        dates,
        vec![date(2024, 3, 3), date(2024, 3, 3), date(2024, 3, 20), date(2024, 3, 20)]
    );
    assert_eq!(entries[0].line_no, 1);
    assert_eq!(entries[1].line_no, 2);
}

#[tokio::test]
async fn test_posted_only_toggle() {
    let repos = setup().await;
    let tenant = TenantId::new();
    let entity = EntityId::new();
    posted(&repos, tenant, entity, 1, dec!(100)).await;
    repos
        .vouchers
        .create_draft(tenant, cash_draft(entity, date(2024, 3, 2), dec!(7)))
        .await
        .unwrap();

    let posted_only = repos.ledger.balances(tenant, LedgerFilter::default()).await.unwrap();
    let cash = posted_only.iter().find(|b| b.account_code == "1001").unwrap();
    assert_eq!(cash.balance, dec!(100));

    let everything = repos
        .ledger
        .balances(
            tenant,
            LedgerFilter {
                posted_only: Some(false),
                ..LedgerFilter::default()
            },
        )
        .await
        .unwrap();
    let cash = everything.iter().find(|b| b.account_code == "1001").unwrap();
    assert_eq!(cash.balance, dec!(107));
}

#[tokio::test]
async fn test_as_of_date_and_period_filters() {
    let repos = setup().await;
    let tenant = TenantId::new();
    let entity = EntityId::new();
    posted(&repos, tenant, entity, 5, dec!(10)).await;
    posted(&repos, tenant, entity, 25, dec!(20)).await;

    let as_of = repos
        .ledger
        .balances(
            tenant,
            LedgerFilter {
                account_code: Some("6602".into()),
                as_of_date: Some(date(2024, 3, 10)),
                ..LedgerFilter::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(as_of[0].balance, dec!(-10));

    let april = repos
        .ledger
        .entries(
            tenant,
            LedgerFilter {
                period: Some("2024-04".parse().unwrap()),
                ..LedgerFilter::default()
            },
        )
        .await
        .unwrap();
    assert!(april.is_empty());

    let err = repos
        .ledger
        .entries(
            tenant,
            LedgerFilter {
                period: Some("2024-03".parse().unwrap()),
                date_to: Some(date(2024, 3, 31)),
                ..LedgerFilter::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));
}

#[tokio::test]
async fn test_consolidation_pages_through_entities() {
    let repos = setup().await;
    let tenant = TenantId::new();
    let entities: Vec<EntityId> = (0..3).map(|_| EntityId::new()).collect();
    for (i, entity) in entities.iter().enumerate() {
        posted(&repos, tenant, *entity, 1, Decimal::from(100 * (i + 1))).await;
    }
    // Another tenant never shows up.
    posted(&repos, TenantId::new(), EntityId::new(), 1, dec!(999)).await;

    let cancel = CancellationToken::new();
    let first = repos
        .consolidation
        .consolidated(tenant, request(GroupBy::Entity, None), &cancel)
        .await
        .unwrap();
    assert_eq!(first.entities.len(), 2);
    let cursor = first.next_cursor.expect("a second page");

    let second = repos
        .consolidation
        .consolidated(tenant, request(GroupBy::Entity, Some(cursor)), &cancel)
        .await
        .unwrap();
    assert_eq!(second.entities.len(), 1);
    assert!(second.next_cursor.is_none());

    let seen: HashSet<EntityId> = first
        .entities
        .iter()
        .chain(&second.entities)
        .map(|e| e.entity_id)
        .collect();
    assert_eq!(seen, entities.into_iter().collect());
}

#[tokio::test]
async fn test_consolidation_summed() {
    let repos = setup().await;
    let tenant = TenantId::new();
    posted(&repos, tenant, EntityId::new(), 1, dec!(100)).await;
    posted(&repos, tenant, EntityId::new(), 2, dec!(250)).await;
    posted(&repos, tenant, EntityId::new(), 3, dec!(50)).await;

    let report = repos
        .consolidation
        .consolidated(tenant, request(GroupBy::None, None), &CancellationToken::new())
        .await
        .unwrap();

    assert!(report.entities.is_empty());
    let cash = report.totals.iter().find(|b| b.account_code == "1001").unwrap();
    assert_eq!(cash.balance, dec!(400));
    let total: Decimal = report.totals.iter().map(|b| b.balance).sum();
    assert!(total.is_zero());
}

#[tokio::test]
async fn test_cancelled_consolidation_returns_nothing() {
    let repos = setup().await;
    let tenant = TenantId::new();
    posted(&repos, tenant, EntityId::new(), 1, dec!(100)).await;

    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = repos
        .consolidation
        .consolidated(tenant, request(GroupBy::None, None), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Cancelled));
}
