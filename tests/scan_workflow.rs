// tests/scan_workflow.rs
//
// Station workflow against a real database. `sqlx::test` creates a fresh
// database per test from DATABASE_URL and applies the migrations.

use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use next_bruss::{
    common::error::AppError,
    db::{ArticleRepository, NewsRepository, ScanRepository},
    models::{
        articles::{ArticleConfigPayload, DmcCheck},
        news::NewsPayload,
        scans::{ScanRejection, ScanResult},
    },
    services::{article_service::ArticleService, news_service::NewsService, scan_service::ScanService},
};

const WORKPLACE: &str = "eol-29";
const ARTICLE: &str = "28042";
const OPERATOR: &str = "1234";

async fn create_tenant(pool: &PgPool) -> Uuid {
    sqlx::query_scalar("INSERT INTO tenants (name, code) VALUES ('Plant', $1) RETURNING id")
        .bind(Uuid::new_v4().simple().to_string())
        .fetch_one(pool)
        .await
        .unwrap()
}

// Same session settings the handlers apply before touching plant data.
async fn plant_tx(pool: &PgPool, tenant_id: Uuid) -> Transaction<'static, Postgres> {
    let mut tx = pool.begin().await.unwrap();
    sqlx::query("SELECT set_config('app.tenant_id', $1, true)")
        .bind(tenant_id.to_string())
        .execute(&mut *tx)
        .await
        .unwrap();
    tx
}

fn article(requires_dmc: bool, boxes_per_pallet: Option<i32>) -> ArticleConfigPayload {
    ArticleConfigPayload {
        workplace: WORKPLACE.into(),
        article_number: ARTICLE.into(),
        article_name: "Bracket".into(),
        pieces_per_box: 2,
        boxes_per_pallet,
        requires_dmc,
        base_dmc: requires_dmc.then(|| "A755200XXXX".to_string()),
        dmc_checks: if requires_dmc { vec![DmcCheck { start: 0, end: 7 }] } else { vec![] },
        dmc_date_check: None,
        hydra_process: None,
    }
}

async fn configure(tx: &mut Transaction<'static, Postgres>, tenant_id: Uuid, payload: &ArticleConfigPayload) {
    ArticleService::new(ArticleRepository::new())
        .create(&mut **tx, tenant_id, payload)
        .await
        .unwrap();
}

fn scans() -> ScanService {
    ScanService::new(ScanRepository::new(), ArticleRepository::new())
}

fn rejection(result: Result<ScanResult, AppError>) -> ScanRejection {
    match result {
        Err(AppError::ScanRejected(rejection)) => rejection,
        other => panic!("expected a scan rejection, got {:?}", other),
    }
}

async fn count_status(tx: &mut Transaction<'static, Postgres>, status: &str) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM scans WHERE status::text = $1")
        .bind(status)
        .fetch_one(&mut **tx)
        .await
        .unwrap()
}

#[sqlx::test(migrations = "./migrations")]
async fn dmc_parts_fill_box_then_pallet_then_warehouse(pool: PgPool) {
    let tenant = create_tenant(&pool).await;
    let mut tx = plant_tx(&pool, tenant).await;
    configure(&mut tx, tenant, &article(true, Some(2))).await;
    let svc = scans();

    let early = svc.save_hydra_batch(&mut *tx, tenant, WORKPLACE, ARTICLE, "A:28042|Q:2|B:H1", OPERATOR).await;
    assert_eq!(rejection(early), ScanRejection::BoxNotFull);

    let first = svc.save_dmc(&mut *tx, tenant, WORKPLACE, ARTICLE, "A755200AAAA", OPERATOR).await.unwrap();
    assert_eq!(first.snapshot.box_count, 1);
    assert!(!first.snapshot.box_full);

    let second = svc.save_dmc(&mut *tx, tenant, WORKPLACE, ARTICLE, "A755200BBBB", OPERATOR).await.unwrap();
    assert_eq!(second.snapshot.box_count, 2);
    assert!(second.snapshot.box_full);

    let overflow = svc.save_dmc(&mut *tx, tenant, WORKPLACE, ARTICLE, "A755200CCCC", OPERATOR).await;
    assert_eq!(rejection(overflow), ScanRejection::BoxFull);

    let closed = svc
        .save_hydra_batch(&mut *tx, tenant, WORKPLACE, ARTICLE, "A:28042|Q:2|B:H1", OPERATOR)
        .await
        .unwrap();
    assert_eq!(closed.affected, 2);
    assert_eq!(closed.snapshot.box_count, 0);
    assert_eq!(closed.snapshot.pallet_box_count, 1);
    assert_eq!(count_status(&mut tx, "PALLET").await, 2);

    let reused = svc.save_hydra_batch(&mut *tx, tenant, WORKPLACE, ARTICLE, "A:28042|Q:2|B:H1", OPERATOR).await;
    assert_eq!(rejection(reused), ScanRejection::Exists);

    let half_pallet = svc.save_pallet_batch(&mut *tx, tenant, WORKPLACE, ARTICLE, "A:28042|Q:4|B:P1", OPERATOR).await;
    assert_eq!(rejection(half_pallet), ScanRejection::PalletNotFull);

    svc.save_dmc(&mut *tx, tenant, WORKPLACE, ARTICLE, "A755200CCCC", OPERATOR).await.unwrap();
    svc.save_dmc(&mut *tx, tenant, WORKPLACE, ARTICLE, "A755200DDDD", OPERATOR).await.unwrap();
    let second_box = svc
        .save_hydra_batch(&mut *tx, tenant, WORKPLACE, ARTICLE, "A:28042|Q:2|B:H2", OPERATOR)
        .await
        .unwrap();
    assert_eq!(second_box.snapshot.pallet_box_count, 2);
    assert!(second_box.snapshot.pallet_full);

    let no_room = svc.save_hydra_batch(&mut *tx, tenant, WORKPLACE, ARTICLE, "A:28042|Q:2|B:H3", OPERATOR).await;
    assert_eq!(rejection(no_room), ScanRejection::PalletFull);

    let shipped = svc
        .save_pallet_batch(&mut *tx, tenant, WORKPLACE, ARTICLE, "A:28042|Q:4|B:P1", OPERATOR)
        .await
        .unwrap();
    assert_eq!(shipped.affected, 4);
    assert_eq!(shipped.snapshot.pallet_box_count, 0);
    assert_eq!(count_status(&mut tx, "WAREHOUSE").await, 4);
}

#[sqlx::test(migrations = "./migrations")]
async fn closed_box_goes_to_warehouse_without_pallet_stage(pool: PgPool) {
    let tenant = create_tenant(&pool).await;
    let mut tx = plant_tx(&pool, tenant).await;
    configure(&mut tx, tenant, &article(true, None)).await;
    let svc = scans();

    svc.save_dmc(&mut *tx, tenant, WORKPLACE, ARTICLE, "A755200AAAA", OPERATOR).await.unwrap();
    svc.save_dmc(&mut *tx, tenant, WORKPLACE, ARTICLE, "A755200BBBB", OPERATOR).await.unwrap();

    let closed = svc
        .save_hydra_batch(&mut *tx, tenant, WORKPLACE, ARTICLE, "A:28042|Q:2|B:H1", OPERATOR)
        .await
        .unwrap();
    assert_eq!(closed.affected, 2);
    assert_eq!(count_status(&mut tx, "WAREHOUSE").await, 2);
    assert_eq!(count_status(&mut tx, "PALLET").await, 0);

    let pallet = svc.save_pallet_batch(&mut *tx, tenant, WORKPLACE, ARTICLE, "A:28042|Q:4|B:P1", OPERATOR).await;
    assert_eq!(rejection(pallet), ScanRejection::NoPalletStage);
}

#[sqlx::test(migrations = "./migrations")]
async fn duplicate_dmc_is_rejected_unless_sent_to_rework(pool: PgPool) {
    let tenant = create_tenant(&pool).await;
    let mut tx = plant_tx(&pool, tenant).await;
    configure(&mut tx, tenant, &article(true, Some(2))).await;
    let svc = scans();

    svc.save_dmc(&mut *tx, tenant, WORKPLACE, ARTICLE, "A755200AAAA", OPERATOR).await.unwrap();

    let duplicate = svc.save_dmc(&mut *tx, tenant, WORKPLACE, ARTICLE, " A755200AAAA ", OPERATOR).await;
    assert_eq!(rejection(duplicate), ScanRejection::Exists);

    let reworked = svc
        .mark_rework(&mut *tx, tenant, "A755200AAAA", "scratched", "quality@bruss.example")
        .await
        .unwrap();
    assert_eq!(reworked.rework_reason.as_deref(), Some("scratched"));

    let rescanned = svc.save_dmc(&mut *tx, tenant, WORKPLACE, ARTICLE, "A755200AAAA", OPERATOR).await.unwrap();
    assert_eq!(rescanned.snapshot.box_count, 1);

    let again = svc.save_dmc(&mut *tx, tenant, WORKPLACE, ARTICLE, "A755200AAAA", OPERATOR).await;
    assert_eq!(rejection(again), ScanRejection::Exists);
}

#[sqlx::test(migrations = "./migrations")]
async fn rework_of_unknown_dmc_is_not_found(pool: PgPool) {
    let tenant = create_tenant(&pool).await;
    let mut tx = plant_tx(&pool, tenant).await;

    let result = scans()
        .mark_rework(&mut *tx, tenant, "A755200ZZZZ", "scratched", "quality@bruss.example")
        .await;
    assert!(matches!(result, Err(AppError::ResourceNotFound(_))));
}

#[sqlx::test(migrations = "./migrations")]
async fn counted_boxes_fill_a_pallet(pool: PgPool) {
    let tenant = create_tenant(&pool).await;
    let mut tx = plant_tx(&pool, tenant).await;
    configure(&mut tx, tenant, &article(false, Some(2))).await;
    let svc = scans();

    let dmc = svc.save_dmc(&mut *tx, tenant, WORKPLACE, ARTICLE, "A755200AAAA", OPERATOR).await;
    assert_eq!(rejection(dmc), ScanRejection::WrongProcess);

    let first = svc.count_box(&mut *tx, tenant, WORKPLACE, ARTICLE, OPERATOR).await.unwrap();
    assert_eq!(first.snapshot.pallet_box_count, 1);
    let second = svc.count_box(&mut *tx, tenant, WORKPLACE, ARTICLE, OPERATOR).await.unwrap();
    assert!(second.snapshot.pallet_full);

    let third = svc.count_box(&mut *tx, tenant, WORKPLACE, ARTICLE, OPERATOR).await;
    assert_eq!(rejection(third), ScanRejection::PalletFull);

    let shipped = svc
        .save_pallet_batch(&mut *tx, tenant, WORKPLACE, ARTICLE, "A:28042|Q:4|B:P1", OPERATOR)
        .await
        .unwrap();
    assert_eq!(shipped.affected, 2);
    assert_eq!(shipped.snapshot.pallet_box_count, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn toggling_pin_flips_only_the_flag(pool: PgPool) {
    let tenant = create_tenant(&pool).await;
    let mut tx = plant_tx(&pool, tenant).await;
    let svc = NewsService::new(NewsRepository::new());

    let payload = NewsPayload {
        title: "Shift change".into(),
        content: "Line 29 moves to three shifts from Monday.".into(),
        is_pinned: false,
    };
    let posted = svc.create(&mut *tx, tenant, "editor@bruss.example", &payload).await.unwrap();

    let pinned = svc.toggle_pin(&mut *tx, tenant, posted.id).await.unwrap();
    assert!(pinned.is_pinned);
    assert_eq!(pinned.title, posted.title);
    assert_eq!(pinned.content, posted.content);
    assert_eq!(pinned.author, posted.author);
    assert_eq!(pinned.created_at, posted.created_at);
    assert_eq!(pinned.edited_at, posted.edited_at);

    let unpinned = svc.toggle_pin(&mut *tx, tenant, posted.id).await.unwrap();
    assert!(!unpinned.is_pinned);
}
