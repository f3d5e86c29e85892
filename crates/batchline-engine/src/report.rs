//! # Reporting Aggregator
//!
//! Summarizes a finished [`BatchResult`] into operational statistics.
//!
//! ## Report Contents
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  counts       total_records, success_count, error_count                │
//! │  rates        success_rate = successes / max(1, total) × 100           │
//! │               error_rate   = errors / max(1, successes + errors) × 100 │
//! │  performance  items_per_second → THROUGHPUT_CLASS                      │
//! │  quality      error_rate       → QUALITY_BY_ERROR_RATE                 │
//! │  population   age_groups (users and order customers)                   │
//! │  financial    average discount, average salary, total tax, total fees, │
//! │               order count, revenue                                     │
//! │                                                                         │
//! │  Over 10 KB serialized → violations dropped, truncated = true,         │
//! │  original_size = untruncated byte length.                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Money fields serialize as integer cents.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use batchline_core::rules::{
    QualityGrade, ThroughputClass, QUALITY_BY_ERROR_RATE, REPORT_SIZE_LIMIT_BYTES,
    THROUGHPUT_CLASS,
};
use batchline_core::{AgeCategory, DerivedEntity, Money};

use crate::error::EngineResult;
use crate::orchestrator::BatchResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub batch_id: Uuid,
    pub generated_at: DateTime<Utc>,

    pub total_records: usize,
    pub success_count: usize,
    pub error_count: usize,
    pub success_rate: f64,
    pub error_rate: f64,

    pub processing_time_ms: u64,
    pub items_per_second: f64,
    pub performance: ThroughputClass,
    pub quality: QualityGrade,

    pub age_groups: BTreeMap<AgeCategory, usize>,
    /// Mean user discount, in percent.
    pub average_discount_rate: f64,
    /// Sum of user salaries divided by the number of onboarded users.
    pub average_salary: Money,
    /// User estimated tax plus order sales tax.
    pub total_tax: Money,
    pub total_fees: Money,
    pub order_count: usize,
    pub revenue: Money,

    pub violations: Vec<String>,
    pub collaborator_failure_count: usize,
    pub cancelled: bool,
    pub truncated: bool,
    pub original_size: Option<usize>,
}

impl Report {
    /// Builds the report for a finished batch.
    pub fn summarize(result: &BatchResult) -> Report {
        let total = result.total_records;
        let processed = result.successes + result.failures;
        let success_rate = percent(result.successes, total);
        let error_rate = percent(result.failures, processed);
        let items_per_second = throughput(total, result.elapsed);

        let mut age_groups: BTreeMap<AgeCategory, usize> =
            AgeCategory::ALL.iter().map(|c| (*c, 0)).collect();
        for entity in &result.entities {
            *age_groups.entry(entity.category()).or_default() += 1;
        }

        let users: Vec<_> = result.entities.iter().filter_map(DerivedEntity::as_user).collect();
        let orders: Vec<_> = result.entities.iter().filter_map(DerivedEntity::as_order).collect();

        let average_discount_rate = if users.is_empty() {
            0.0
        } else {
            users.iter().map(|u| u.discount_rate.percentage()).sum::<f64>() / users.len() as f64
        };
        let salary_sum: Money = users.iter().filter_map(|u| u.salary).sum();
        let average_salary = match i64::try_from(users.len()) {
            Ok(n) if n > 0 => Money::from_cents(salary_sum.cents() / n),
            _ => Money::zero(),
        };

        let user_tax: Money = users.iter().filter_map(|u| u.estimated_tax).sum();
        let order_tax: Money = orders.iter().map(|o| o.tax_amount).sum();
        let total_fees: Money = users.iter().filter_map(|u| u.processing_fee).sum();
        let revenue: Money = orders.iter().map(|o| o.total).sum();

        let report = Report {
            batch_id: result.batch_id,
            generated_at: Utc::now(),
            total_records: total,
            success_count: result.successes,
            error_count: result.failures,
            success_rate,
            error_rate,
            processing_time_ms: u64::try_from(result.elapsed.as_millis()).unwrap_or(u64::MAX),
            items_per_second,
            performance: THROUGHPUT_CLASS.lookup(items_per_second),
            quality: QUALITY_BY_ERROR_RATE.lookup(error_rate),
            age_groups,
            average_discount_rate,
            average_salary,
            total_tax: user_tax + order_tax,
            total_fees,
            order_count: orders.len(),
            revenue,
            violations: result.violations.iter().map(|v| v.message.clone()).collect(),
            collaborator_failure_count: result.collaborator_failures.len(),
            cancelled: result.cancelled,
            truncated: false,
            original_size: None,
        };

        report.bounded(REPORT_SIZE_LIMIT_BYTES)
    }

    /// Pretty JSON form, as stored and printed.
    pub fn to_json(&self) -> EngineResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Drops violation details when the serialized form exceeds `limit`.
    fn bounded(mut self, limit: usize) -> Report {
        let size = self.to_json().map(|s| s.len()).unwrap_or(0);
        if size > limit {
            self.violations.clear();
            self.truncated = true;
            self.original_size = Some(size);
        }
        self
    }
}

fn percent(part: usize, whole: usize) -> f64 {
    part as f64 / whole.max(1) as f64 * 100.0
}

/// Records per second, with elapsed time floored at one millisecond.
fn throughput(records: usize, elapsed: Duration) -> f64 {
    let secs = elapsed.max(Duration::from_millis(1)).as_secs_f64();
    records as f64 / secs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::Violation;
    use batchline_core::derivation::onboard;
    use batchline_core::validation::NormalizedFields;

    fn user(index: usize, age: u32, salary: Option<i64>) -> DerivedEntity {
        let fields = NormalizedFields {
            email: Some(format!("u{index}@example.com")),
            age: Some(age),
            salary: salary.map(Money::from_dollars),
            ..Default::default()
        };
        DerivedEntity::User(onboard(&fields, index).unwrap())
    }

    fn result(entities: Vec<DerivedEntity>, failures: usize, elapsed: Duration) -> BatchResult {
        let mut result = BatchResult::new(Uuid::new_v4(), entities.len() + failures);
        result.successes = entities.len();
        result.failures = failures;
        result.entities = entities;
        result.elapsed = elapsed;
        result
    }

    #[test]
    fn test_rates_and_grades() {
        let entities = vec![user(0, 20, None), user(1, 40, None), user(2, 70, None)];
        let report = Report::summarize(&result(entities, 1, Duration::from_secs(1)));

        assert_eq!(report.total_records, 4);
        assert!((report.success_rate - 75.0).abs() < 1e-9);
        assert!((report.error_rate - 25.0).abs() < 1e-9);
        assert_eq!(report.quality, QualityGrade::Poor);
        assert!((report.items_per_second - 4.0).abs() < 1e-9);
        assert_eq!(report.performance, ThroughputClass::Poor);
    }

    #[test]
    fn test_zero_elapsed_is_floored() {
        let report = Report::summarize(&result(vec![user(0, 30, None)], 0, Duration::ZERO));
        assert!((report.items_per_second - 1000.0).abs() < 1e-6);
        assert_eq!(report.performance, ThroughputClass::Excellent);
        assert_eq!(report.quality, QualityGrade::Excellent);
    }

    #[test]
    fn test_age_groups_and_financials() {
        let entities = vec![
            user(0, 17, None),
            user(1, 25, Some(50_000)),
            user(2, 52, Some(150_000)),
        ];
        let report = Report::summarize(&result(entities, 0, Duration::from_millis(10)));

        assert_eq!(report.age_groups[&AgeCategory::Minor], 1);
        assert_eq!(report.age_groups[&AgeCategory::YoungAdult], 1);
        assert_eq!(report.age_groups[&AgeCategory::Adult], 0);
        assert_eq!(report.age_groups[&AgeCategory::Senior], 1);

        // Salary sum over all three users, including the one without salary.
        assert_eq!(report.average_salary, Money::from_cents(20_000_000 / 3));
        // 15% of 50k + 25% of 150k
        assert_eq!(report.total_tax, Money::from_dollars(7_500 + 37_500));
        assert_eq!(report.total_fees, Money::from_dollars(1_000 + 3_000));
        // (15 + 10 + 10) / 3
        assert!((report.average_discount_rate - 35.0 / 3.0).abs() < 1e-9);
        assert_eq!(report.order_count, 0);
        assert!(report.revenue.is_zero());
    }

    #[test]
    fn test_empty_batch_report() {
        let mut empty = BatchResult::new(Uuid::new_v4(), 0);
        empty.violations.push(Violation::batch("record list cannot be empty"));
        let report = Report::summarize(&empty);

        assert_eq!(report.success_rate, 0.0);
        assert_eq!(report.error_rate, 0.0);
        assert_eq!(report.average_salary, Money::zero());
        assert_eq!(report.violations, vec!["record list cannot be empty"]);
    }

    #[test]
    fn test_json_form_round_trips() {
        let report = Report::summarize(&result(vec![user(0, 30, Some(40_000))], 0, Duration::from_millis(5)));
        let json = report.to_json().unwrap();
        let parsed: Report = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.batch_id, report.batch_id);
        assert_eq!(parsed.average_salary, Money::from_dollars(40_000));
    }

    #[test]
    fn test_oversized_report_is_truncated() {
        let mut big = result(vec![], 500, Duration::from_secs(1));
        for i in 0..500 {
            big.violations.push(Violation::record(i, "email has invalid format: expected local@domain.tld"));
        }
        let report = Report::summarize(&big);

        assert!(report.truncated);
        assert!(report.violations.is_empty());
        assert!(report.original_size.unwrap() > REPORT_SIZE_LIMIT_BYTES);
        assert_eq!(report.error_count, 500);
    }
}
