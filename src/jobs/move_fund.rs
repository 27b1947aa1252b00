//! Move a POL's encumbrance to a different fund after rollover
//!
//! The POL's single unreleased encumbrance in the chosen fiscal year is
//! released, then the fund distribution is pointed at the new fund with a
//! fresh encumbrance id. Saving the POL with an unknown encumbrance id makes
//! the orders module create a new encumbrance on the new fund.

use super::{
    distributions_json, from_json, load_target, log_distributions, put_po_line, write_outcome,
    JobOptions,
};
use crate::batch::{Outcome, RecordMutator};
use crate::finance::FundIndex;
use crate::folio::{
    po_line_path, query, release_encumbrance_path, ApiError, FolioApi, TRANSACTIONS_PATH,
};
use crate::mapping::MappingEntry;
use crate::model::{FiscalYear, PurchaseOrderLine, Transaction};
use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

pub struct MoveFund {
    funds: FundIndex,
    fiscal_year: FiscalYear,
    options: JobOptions,
}

impl MoveFund {
    pub fn new(funds: FundIndex, fiscal_year: FiscalYear, options: JobOptions) -> Self {
        Self {
            funds,
            fiscal_year,
            options,
        }
    }

    async fn unreleased_encumbrances(
        &self,
        api: &dyn FolioApi,
        pol: &PurchaseOrderLine,
    ) -> Result<Vec<Transaction>, ApiError> {
        let cql = query::unreleased_encumbrances(&pol.id, &self.fiscal_year.id);
        api.get_all(TRANSACTIONS_PATH, "transactions", Some(&cql))
            .await?
            .into_iter()
            .map(from_json)
            .collect()
    }

    /// Re-read the POL and warn if the stored fund is not the one written
    async fn verify(&self, api: &dyn FolioApi, pol_id: &str, code: &str) -> Result<(), ApiError> {
        match api.get_json(&po_line_path(pol_id), None).await {
            Ok(stored) => {
                let stored: PurchaseOrderLine = match from_json(stored) {
                    Ok(stored) => stored,
                    Err(e) => {
                        warn!("Could not read back POL {}: {}", pol_id, e);
                        return Ok(());
                    }
                };
                log_distributions("stored", stored.distributions());
                if stored.fund_codes().iter().any(|c| *c != code) {
                    warn!(
                        "POL {} was saved but now carries fund(s) {:?}, expected {}",
                        pol_id,
                        stored.fund_codes(),
                        code
                    );
                }
                Ok(())
            }
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                warn!("Could not re-read POL {}: {}", pol_id, e);
                Ok(())
            }
        }
    }
}

#[async_trait]
impl RecordMutator for MoveFund {
    type Item = MappingEntry;

    fn name(&self) -> &'static str {
        "move-fund"
    }

    fn describe(&self, entry: &MappingEntry) -> (String, String) {
        (entry.key.clone(), entry.value.clone())
    }

    async fn apply(&self, api: &dyn FolioApi, entry: &MappingEntry) -> Result<Outcome, ApiError> {
        let Some(fund) = self.funds.get(&entry.value) else {
            return Ok(Outcome::manual_review("fund code does not exist"));
        };

        let pol = match load_target(api, &entry.key, &self.options.filter).await? {
            Ok(pol) => pol,
            Err(outcome) => return Ok(outcome),
        };

        let distributions = pol.distributions();
        match distributions.len() {
            0 => {
                return Ok(Outcome::manual_review("POL has 0 fund distributions").with_record(&pol.id))
            }
            1 => {}
            n => {
                return Ok(Outcome::manual_review(format!("POL has {} fund distributions", n))
                    .with_record(&pol.id))
            }
        }
        if distributions[0].code == fund.code && distributions[0].fund_id == fund.id {
            return Ok(Outcome::unchanged(format!("already on fund {}", fund.code)).with_record(&pol.id));
        }
        let original = distributions_json(distributions);

        let encumbrances = self.unreleased_encumbrances(api, &pol).await?;
        if encumbrances.len() != 1 {
            return Ok(Outcome::manual_review(format!(
                "POL has {} unreleased encumbrances in {}",
                encumbrances.len(),
                self.fiscal_year.code
            ))
            .with_record(&pol.id)
            .with_original(original));
        }
        let encumbrance = &encumbrances[0];

        let mut updated = pol.clone();
        for dist in updated.fund_distribution.iter_mut().flatten() {
            dist.code = fund.code.clone();
            dist.fund_id = fund.id.clone();
            dist.encumbrance = Some(Uuid::new_v4().to_string());
        }
        log_distributions("original", pol.distributions());
        log_distributions("updated", updated.distributions());

        if self.options.dry_run {
            return Ok(Outcome::dry_run(format!(
                "would release encumbrance {} and re-encumber on {}",
                encumbrance.id, fund.code
            ))
            .with_record(&pol.id)
            .with_original(original));
        }

        debug!("Releasing encumbrance {} for POL {}", encumbrance.id, pol.id);
        let released = api
            .post_json(
                &release_encumbrance_path(&encumbrance.id),
                &json!({ "id": encumbrance.id }),
            )
            .await?;
        if released.status != 204 {
            return Ok(Outcome::failed(
                Some(released.status),
                format!("failed to release encumbrance: {}", released.body.trim()),
            )
            .with_record(&pol.id)
            .with_original(original));
        }

        let response = put_po_line(api, &updated).await?;
        let outcome = write_outcome(&response)
            .with_record(&pol.id)
            .with_original(original);
        if response.is_success() {
            self.verify(api, &pol.id, &fund.code).await?;
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::OutcomeKind;
    use crate::folio::{ApiResponse, MockFolioClient};
    use crate::jobs::fixtures::{dist, pol};
    use crate::model::Fund;
    use serde_json::Value;

    /// Delegates to the mock, but single-record reads come back in a shape
    /// that is not a POL
    struct GarbledReadBack(MockFolioClient);

    #[async_trait]
    impl FolioApi for GarbledReadBack {
        async fn get_json(&self, path: &str, query: Option<&str>) -> Result<Value, ApiError> {
            match query {
                None => Ok(json!({"unexpected": true})),
                Some(_) => self.0.get_json(path, query).await,
            }
        }

        async fn get_all(
            &self,
            path: &str,
            key: &str,
            query: Option<&str>,
        ) -> Result<Vec<Value>, ApiError> {
            self.0.get_all(path, key, query).await
        }

        async fn put_json(&self, path: &str, body: &Value) -> Result<ApiResponse, ApiError> {
            self.0.put_json(path, body).await
        }

        async fn post_json(&self, path: &str, body: &Value) -> Result<ApiResponse, ApiError> {
            self.0.post_json(path, body).await
        }
    }

    fn job(dry_run: bool) -> MoveFund {
        let funds = FundIndex::new(vec![
            Fund { id: "f-hist".into(), code: "HIST".into(), name: "History".into() },
            Fund { id: "f-gen".into(), code: "GEN".into(), name: "General".into() },
        ]);
        let fy = FiscalYear {
            id: "fy23".into(),
            code: "FY2023".into(),
            period_start: "2022-07-01T00:00:00Z".into(),
            period_end: "2023-06-30T00:00:00Z".into(),
        };
        MoveFund::new(funds, fy, JobOptions { dry_run, ..Default::default() })
    }

    fn entry(key: &str, value: &str) -> MappingEntry {
        MappingEntry { key: key.into(), value: value.into(), line: 1 }
    }

    async fn with_encumbered_pol() -> MockFolioClient {
        let mock = MockFolioClient::new();
        mock.add_po_line(pol("p1", "100-1", json!([dist("HIST", "f-hist", None)]))).await;
        mock.add_search(
            TRANSACTIONS_PATH,
            &query::unreleased_encumbrances("p1", "fy23"),
            vec![json!({"id": "enc-1", "fiscalYearId": "fy23", "amount": 25.0,
                        "encumbrance": {"status": "Unreleased", "sourcePoLineId": "p1"}})],
        )
        .await;
        mock
    }

    #[tokio::test]
    async fn test_release_then_reencumber() {
        let mock = with_encumbered_pol().await;
        let outcome = job(false).apply(&mock, &entry("100-1", "GEN")).await.unwrap();
        assert_eq!(outcome.kind, OutcomeKind::Updated);

        let writes = mock.writes().await;
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0].method, "POST");
        assert_eq!(writes[0].path, "/finance/release-encumbrance/enc-1");
        assert_eq!(writes[1].method, "PUT");

        let stored = mock.record(&po_line_path("p1")).await.unwrap();
        let fd = &stored["fundDistribution"][0];
        assert_eq!(fd["code"], "GEN");
        assert_eq!(fd["fundId"], "f-gen");
        let new_enc = fd["encumbrance"].as_str().unwrap();
        assert_ne!(new_enc, "enc-f-hist");
        assert!(Uuid::parse_str(new_enc).is_ok());
    }

    #[tokio::test]
    async fn test_unreadable_read_back_still_updated() {
        let api = GarbledReadBack(with_encumbered_pol().await);
        let outcome = job(false).apply(&api, &entry("100-1", "GEN")).await.unwrap();
        assert_eq!(outcome.kind, OutcomeKind::Updated);
        assert_eq!(outcome.record_id.as_deref(), Some("p1"));
        assert!(outcome.original.is_some());

        let stored = api.0.record(&po_line_path("p1")).await.unwrap();
        assert_eq!(stored["fundDistribution"][0]["code"], "GEN");
    }

    #[tokio::test]
    async fn test_unknown_fund_needs_review() {
        let mock = with_encumbered_pol().await;
        let outcome = job(false).apply(&mock, &entry("100-1", "NOPE")).await.unwrap();
        assert_eq!(outcome.kind, OutcomeKind::ManualReview);
        assert_eq!(outcome.message, "fund code does not exist");
        assert!(mock.get_calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_multiple_distributions_need_review() {
        let mock = MockFolioClient::new();
        mock.add_po_line(pol(
            "p1",
            "100-1",
            json!([dist("HIST", "f-hist", None), dist("GEN", "f-gen", None)]),
        ))
        .await;
        let outcome = job(false).apply(&mock, &entry("100-1", "GEN")).await.unwrap();
        assert_eq!(outcome.kind, OutcomeKind::ManualReview);
        assert_eq!(outcome.message, "POL has 2 fund distributions");
    }

    #[tokio::test]
    async fn test_missing_encumbrance_needs_review() {
        let mock = MockFolioClient::new();
        mock.add_po_line(pol("p1", "100-1", json!([dist("HIST", "f-hist", None)]))).await;
        let outcome = job(false).apply(&mock, &entry("100-1", "GEN")).await.unwrap();
        assert_eq!(outcome.kind, OutcomeKind::ManualReview);
        assert!(outcome.message.contains("0 unreleased encumbrances"));
        assert!(mock.writes().await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_release_skips_update() {
        let mock = with_encumbered_pol().await;
        mock.add_post_response(
            "/finance/release-encumbrance/enc-1",
            ApiResponse::new(422, "budget is closed"),
        )
        .await;
        let outcome = job(false).apply(&mock, &entry("100-1", "GEN")).await.unwrap();
        assert_eq!(outcome.kind, OutcomeKind::Failed);
        assert!(outcome.message.starts_with("failed to release encumbrance"));
        assert_eq!(mock.writes().await.len(), 1);
    }

    #[tokio::test]
    async fn test_already_moved_is_noop() {
        let mock = MockFolioClient::new();
        mock.add_po_line(pol("p1", "100-1", json!([dist("GEN", "f-gen", None)]))).await;
        let outcome = job(false).apply(&mock, &entry("100-1", "GEN")).await.unwrap();
        assert_eq!(outcome.kind, OutcomeKind::Unchanged);
        assert!(mock.writes().await.is_empty());
    }

    #[tokio::test]
    async fn test_dry_run() {
        let mock = with_encumbered_pol().await;
        let outcome = job(true).apply(&mock, &entry("100-1", "GEN")).await.unwrap();
        assert_eq!(outcome.kind, OutcomeKind::DryRun);
        assert!(outcome.message.contains("enc-1"));
        assert!(mock.writes().await.is_empty());
    }
}
