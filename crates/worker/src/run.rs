use anyhow::Context;
use chrono::{DateTime, Utc};
use stockadvisor_core::domain::recommendation::RecommendationRecord;
use stockadvisor_core::storage::{ModelStore, ObjectStore, RemoteLoad};
use stockadvisor_core::strategy::Strategy;

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Generate but do not persist.
    pub dry_run: bool,
    /// Regenerate even if the stored record is still current.
    pub force: bool,
}

#[derive(Debug)]
pub enum RunOutcome {
    StillCurrent { valid_to: DateTime<Utc> },
    Generated {
        record: RecommendationRecord,
        saved: bool,
    },
}

/// Regenerates the strategy's record unless the stored one is still current.
pub fn run_strategy<S: ObjectStore>(
    strategy: &dyn Strategy,
    store: &ModelStore<S>,
    bucket: &str,
    now: DateTime<Utc>,
    opts: RunOptions,
) -> anyhow::Result<RunOutcome> {
    let object_name = strategy.recommendation_object_name();

    let existing = match store.load_remote::<RecommendationRecord>(bucket, object_name) {
        RemoteLoad::Found(record) => Some(record),
        RemoteLoad::NotFoundRemote(_) => {
            tracing::info!(strategy = strategy.name(), "no stored recommendation set found");
            None
        }
        RemoteLoad::Error(err) => {
            return Err(err).with_context(|| {
                format!("failed to read stored recommendation {bucket}/{object_name}")
            })
        }
    };

    if let Some(record) = existing.filter(|r| !opts.force && r.is_current(now)) {
        return Ok(RunOutcome::StillCurrent {
            valid_to: record.valid_to,
        });
    }

    let record = strategy
        .generate(now)
        .with_context(|| format!("strategy {} failed", strategy.name()))?;
    tracing::info!(
        strategy = strategy.name(),
        picks = record.securities_set.len(),
        "{}",
        strategy.describe(&record)
    );

    if opts.dry_run {
        return Ok(RunOutcome::Generated {
            record,
            saved: false,
        });
    }

    store
        .save(&record, bucket, object_name)
        .with_context(|| format!("failed to save recommendation {bucket}/{object_name}"))?;
    Ok(RunOutcome::Generated {
        record,
        saved: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, TimeZone};
    use std::cell::Cell;
    use stockadvisor_core::domain::recommendation::SecurityRecommendation;
    use stockadvisor_core::storage::MemoryObjectStore;
    use stockadvisor_core::AdvisorError;

    struct StubStrategy {
        calls: Cell<u32>,
    }

    impl StubStrategy {
        fn new() -> Self {
            Self {
                calls: Cell::new(0),
            }
        }
    }

    fn record_at(now: DateTime<Utc>) -> RecommendationRecord {
        let day = NaiveDate::from_ymd_opt(2020, 6, 10).unwrap();
        RecommendationRecord {
            creation_date: now,
            analysis_start_date: day - Duration::days(14),
            analysis_end_date: day,
            valid_from: now - Duration::hours(1),
            valid_to: now + Duration::days(1),
            price_date: day,
            strategy_name: "STUB".into(),
            security_type: "US_EQUITIES".into(),
            securities_set: vec![SecurityRecommendation {
                ticker_symbol: "AAPL".into(),
                price: 330.0,
            }],
        }
    }

    impl Strategy for StubStrategy {
        fn name(&self) -> &'static str {
            "STUB"
        }

        fn recommendation_object_name(&self) -> &str {
            "stub.json"
        }

        fn generate(&self, now: DateTime<Utc>) -> Result<RecommendationRecord, AdvisorError> {
            self.calls.set(self.calls.get() + 1);
            Ok(record_at(now))
        }

        fn describe(&self, record: &RecommendationRecord) -> String {
            format!("{} picks", record.securities_set.len())
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 6, 10, 23, 0, 0).unwrap()
    }

    fn store() -> (tempfile::TempDir, ModelStore<MemoryObjectStore>) {
        let seed = tempfile::tempdir().unwrap();
        let store = ModelStore::new(MemoryObjectStore::new(), seed.path());
        (seed, store)
    }

    #[test]
    fn generates_and_saves_when_nothing_stored() {
        let (_seed, store) = store();
        let strategy = StubStrategy::new();

        let outcome = run_strategy(&strategy, &store, "sa-data", now(), RunOptions::default()).unwrap();
        assert!(matches!(outcome, RunOutcome::Generated { saved: true, .. }));
        assert_eq!(strategy.calls.get(), 1);
        assert!(matches!(
            store.load_remote::<RecommendationRecord>("sa-data", "stub.json"),
            RemoteLoad::Found(_)
        ));
    }

    #[test]
    fn skips_when_stored_record_is_current() {
        let (_seed, store) = store();
        store.save(&record_at(now()), "sa-data", "stub.json").unwrap();
        let strategy = StubStrategy::new();

        let later = now() + Duration::hours(2);
        let outcome = run_strategy(&strategy, &store, "sa-data", later, RunOptions::default()).unwrap();
        assert!(matches!(outcome, RunOutcome::StillCurrent { .. }));
        assert_eq!(strategy.calls.get(), 0);

        let forced = RunOptions {
            force: true,
            ..Default::default()
        };
        run_strategy(&strategy, &store, "sa-data", later, forced).unwrap();
        assert_eq!(strategy.calls.get(), 1);
    }

    #[test]
    fn regenerates_stale_record() {
        let (_seed, store) = store();
        store.save(&record_at(now()), "sa-data", "stub.json").unwrap();
        let strategy = StubStrategy::new();

        let outcome =
            run_strategy(&strategy, &store, "sa-data", now() + Duration::days(3), RunOptions::default())
                .unwrap();
        assert!(matches!(outcome, RunOutcome::Generated { saved: true, .. }));
    }

    #[test]
    fn dry_run_does_not_save() {
        let (_seed, store) = store();
        let strategy = StubStrategy::new();
        let opts = RunOptions {
            dry_run: true,
            ..Default::default()
        };

        let outcome = run_strategy(&strategy, &store, "sa-data", now(), opts).unwrap();
        assert!(matches!(outcome, RunOutcome::Generated { saved: false, .. }));
        assert!(store.remote().is_empty());
    }

    #[test]
    fn corrupt_stored_record_aborts() {
        let (_seed, store) = store();
        store
            .remote()
            .put("sa-data", "recommendations/stub.json", b"{\"strategy_name\": 1}")
            .unwrap();
        let strategy = StubStrategy::new();

        assert!(run_strategy(&strategy, &store, "sa-data", now(), RunOptions::default()).is_err());
        assert_eq!(strategy.calls.get(), 0);
    }
}
