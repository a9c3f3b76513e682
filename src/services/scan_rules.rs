// src/services/scan_rules.rs
//
// Acceptance checks for scanned codes. Everything here is pure: the
// counting and persistence live in `scan_service`.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::models::{
    articles::{ArticleConfig, DmcDateCheck, DmcDateFormat},
    scans::ScanRejection,
};

/// Fields of a HYDRA box label or a pallet label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelFields {
    pub article: String,
    pub quantity: i64,
    pub batch: String,
    pub process: Option<String>,
}

/// Checks a scanned DMC against the article's base DMC.
pub fn validate_dmc(dmc: &str, config: &ArticleConfig, today: NaiveDate) -> Result<(), ScanRejection> {
    let dmc = dmc.trim();
    let base = config.base_dmc.as_deref().ok_or(ScanRejection::WrongProcess)?;

    if !dmc.is_ascii() || dmc.len() != base.len() {
        return Err(ScanRejection::Invalid);
    }

    for check in config.dmc_checks.iter() {
        match (dmc.get(check.start..check.end), base.get(check.start..check.end)) {
            (Some(scanned), Some(expected)) if scanned == expected => {}
            _ => return Err(ScanRejection::Invalid),
        }
    }

    if let Some(date_check) = config.dmc_date_check.as_deref() {
        check_dmc_date(dmc, date_check, today)?;
    }

    Ok(())
}

fn check_dmc_date(dmc: &str, check: &DmcDateCheck, today: NaiveDate) -> Result<(), ScanRejection> {
    let end = check
        .start
        .checked_add(check.format.width())
        .ok_or(ScanRejection::Invalid)?;
    let raw = dmc.get(check.start..end).ok_or(ScanRejection::Invalid)?;
    let date = parse_dmc_date(raw, check.format).ok_or(ScanRejection::Invalid)?;

    let age = (today - date).num_days();
    if age < 0 || age > check.max_age_days {
        return Err(ScanRejection::WrongDate);
    }
    Ok(())
}

fn parse_dmc_date(raw: &str, format: DmcDateFormat) -> Option<NaiveDate> {
    if !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year = 2000 + raw.get(0..2)?.parse::<i32>().ok()?;
    match format {
        DmcDateFormat::YearOrdinal => {
            let ordinal = raw.get(2..5)?.parse::<u32>().ok()?;
            NaiveDate::from_yo_opt(year, ordinal)
        }
        DmcDateFormat::YearMonthDay => {
            let month = raw.get(2..4)?.parse::<u32>().ok()?;
            let day = raw.get(4..6)?.parse::<u32>().ok()?;
            NaiveDate::from_ymd_opt(year, month, day)
        }
    }
}

/// Splits a `KEY:value|KEY:value` label payload.
pub fn parse_label(qr: &str) -> Result<LabelFields, ScanRejection> {
    let mut fields: HashMap<&str, &str> = HashMap::new();
    for part in qr.trim().split('|').filter(|p| !p.is_empty()) {
        let (key, value) = part.split_once(':').ok_or(ScanRejection::Invalid)?;
        let value = value.trim();
        if value.is_empty() {
            return Err(ScanRejection::Invalid);
        }
        fields.insert(key.trim(), value);
    }

    let article = fields.get("A").ok_or(ScanRejection::Invalid)?;
    let quantity = fields
        .get("Q")
        .and_then(|q| q.parse::<i64>().ok())
        .filter(|q| *q > 0)
        .ok_or(ScanRejection::Invalid)?;
    let batch = fields.get("B").ok_or(ScanRejection::Invalid)?;

    Ok(LabelFields {
        article: article.to_string(),
        quantity,
        batch: batch.to_string(),
        process: fields.get("O").map(|o| o.to_string()),
    })
}

/// HYDRA label of one full box.
pub fn check_hydra_label(label: &LabelFields, config: &ArticleConfig) -> Result<(), ScanRejection> {
    if label.article != config.article_number {
        return Err(ScanRejection::WrongArticle);
    }
    if let Some(expected) = config.hydra_process.as_deref() {
        if label.process.as_deref() != Some(expected) {
            return Err(ScanRejection::WrongProcess);
        }
    }
    if label.quantity != i64::from(config.pieces_per_box) {
        return Err(ScanRejection::WrongQuantity);
    }
    Ok(())
}

/// Label of one full pallet.
pub fn check_pallet_label(label: &LabelFields, config: &ArticleConfig) -> Result<(), ScanRejection> {
    let expected_quantity = config.pallet_quantity().ok_or(ScanRejection::NoPalletStage)?;
    if label.article != config.article_number {
        return Err(ScanRejection::WrongArticle);
    }
    if label.quantity != expected_quantity {
        return Err(ScanRejection::WrongQuantity);
    }
    Ok(())
}

/// Payload printed on a generated pallet label.
pub fn pallet_label_payload(config: &ArticleConfig, batch: &str) -> Option<String> {
    config
        .pallet_quantity()
        .map(|qty| format!("A:{}|Q:{}|B:{}", config.article_number, qty, batch))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::articles::DmcCheck;
    use chrono::Utc;
    use sqlx::types::Json;
    use uuid::Uuid;

    // Positions 7..12 carry the production date as YYDDD.
    const BASE: &str = "A755200";

    fn config() -> ArticleConfig {
        ArticleConfig {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            workplace: "eol-29".into(),
            article_number: "28042".into(),
            article_name: "Bracket".into(),
            pieces_per_box: 12,
            boxes_per_pallet: Some(20),
            requires_dmc: true,
            base_dmc: Some(format!("{}24150XYZ0001", BASE)),
            dmc_checks: Json(vec![DmcCheck { start: 0, end: 7 }]),
            dmc_date_check: Some(Json(DmcDateCheck {
                start: 7,
                format: DmcDateFormat::YearOrdinal,
                max_age_days: 30,
            })),
            hydra_process: Some("050".into()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // 2024-05-29 is day 150 of the leap year 2024.
    fn today() -> NaiveDate {
        day(2024, 6, 10)
    }

    #[test]
    fn matching_dmc_is_accepted() {
        assert_eq!(validate_dmc("A75520024150QQQ0077", &config(), today()), Ok(()));
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        assert_eq!(validate_dmc("  A75520024150QQQ0077\n", &config(), today()), Ok(()));
    }

    #[test]
    fn wrong_length_is_invalid() {
        assert_eq!(validate_dmc("A75520024150QQQ007", &config(), today()), Err(ScanRejection::Invalid));
    }

    #[test]
    fn fixed_prefix_mismatch_is_invalid() {
        assert_eq!(validate_dmc("B75520024150QQQ0077", &config(), today()), Err(ScanRejection::Invalid));
    }

    #[test]
    fn non_ascii_is_invalid() {
        assert_eq!(validate_dmc("Ä7552024150QQQ0077", &config(), today()), Err(ScanRejection::Invalid));
    }

    #[test]
    fn old_production_date_is_wrong_date() {
        // day 100 of 2024 is 2024-04-09, 62 days before today
        assert_eq!(validate_dmc("A75520024100QQQ0077", &config(), today()), Err(ScanRejection::WrongDate));
    }

    #[test]
    fn future_production_date_is_wrong_date() {
        assert_eq!(validate_dmc("A75520024200QQQ0077", &config(), today()), Err(ScanRejection::WrongDate));
    }

    #[test]
    fn unparsable_date_is_invalid() {
        assert_eq!(validate_dmc("A75520024999QQQ0077", &config(), today()), Err(ScanRejection::Invalid));
        assert_eq!(validate_dmc("A755200X4150QQQ0077", &config(), today()), Err(ScanRejection::Invalid));
    }

    #[test]
    fn stored_date_offset_at_usize_max_is_invalid() {
        let mut cfg = config();
        cfg.dmc_date_check = Some(Json(DmcDateCheck {
            start: usize::MAX,
            format: DmcDateFormat::YearOrdinal,
            max_age_days: 30,
        }));
        assert_eq!(validate_dmc("A75520024150QQQ0077", &cfg, today()), Err(ScanRejection::Invalid));
    }

    #[test]
    fn year_month_day_dates_are_parsed() {
        assert_eq!(parse_dmc_date("240610", DmcDateFormat::YearMonthDay), Some(day(2024, 6, 10)));
        assert_eq!(parse_dmc_date("241310", DmcDateFormat::YearMonthDay), None);
        assert_eq!(parse_dmc_date("24150", DmcDateFormat::YearOrdinal), Some(day(2024, 5, 29)));
    }

    #[test]
    fn article_without_base_dmc_is_wrong_process() {
        let mut cfg = config();
        cfg.base_dmc = None;
        assert_eq!(validate_dmc("whatever", &cfg, today()), Err(ScanRejection::WrongProcess));
    }

    #[test]
    fn hydra_label_fields_are_extracted_in_any_order() {
        let label = parse_label("B:H-2024-0001|A:28042|Q:12|O:050").unwrap();
        assert_eq!(
            label,
            LabelFields {
                article: "28042".into(),
                quantity: 12,
                batch: "H-2024-0001".into(),
                process: Some("050".into()),
            }
        );
    }

    #[test]
    fn malformed_labels_are_invalid() {
        assert_eq!(parse_label("28042|12|H1"), Err(ScanRejection::Invalid));
        assert_eq!(parse_label("A:28042|Q:twelve|B:H1"), Err(ScanRejection::Invalid));
        assert_eq!(parse_label("A:28042|Q:12"), Err(ScanRejection::Invalid));
        assert_eq!(parse_label("A:28042|Q:0|B:H1"), Err(ScanRejection::Invalid));
        assert_eq!(parse_label("A:|Q:12|B:H1"), Err(ScanRejection::Invalid));
    }

    #[test]
    fn hydra_label_checks_run_in_order() {
        let cfg = config();
        let mut label = parse_label("A:28042|O:050|Q:12|B:H1").unwrap();
        assert_eq!(check_hydra_label(&label, &cfg), Ok(()));

        label.quantity = 10;
        assert_eq!(check_hydra_label(&label, &cfg), Err(ScanRejection::WrongQuantity));

        label.process = Some("060".into());
        assert_eq!(check_hydra_label(&label, &cfg), Err(ScanRejection::WrongProcess));

        label.article = "11111".into();
        assert_eq!(check_hydra_label(&label, &cfg), Err(ScanRejection::WrongArticle));
    }

    #[test]
    fn pallet_label_needs_full_pallet_quantity() {
        let cfg = config();
        let ok = parse_label("A:28042|Q:240|B:P1").unwrap();
        assert_eq!(check_pallet_label(&ok, &cfg), Ok(()));

        let short = parse_label("A:28042|Q:228|B:P1").unwrap();
        assert_eq!(check_pallet_label(&short, &cfg), Err(ScanRejection::WrongQuantity));
    }

    #[test]
    fn pallet_label_on_unpalletized_article_is_refused() {
        let mut cfg = config();
        cfg.boxes_per_pallet = None;
        let label = parse_label("A:28042|Q:240|B:P1").unwrap();
        assert_eq!(check_pallet_label(&label, &cfg), Err(ScanRejection::NoPalletStage));
        assert_eq!(pallet_label_payload(&cfg, "P1"), None);
    }

    #[test]
    fn generated_pallet_payload_parses_back() {
        let cfg = config();
        let payload = pallet_label_payload(&cfg, "P-77").unwrap();
        let label = parse_label(&payload).unwrap();
        assert_eq!(check_pallet_label(&label, &cfg), Ok(()));
        assert_eq!(label.batch, "P-77");
    }
}
