//! Analysis engine: executes synthesized queries and turns rows into insights.
//!
//! The engine owns no storage. It hands each [`AnalyticalQuery`] to an injected
//! [`QueryExecutor`] and treats an executor error the same as an empty result, so
//! callers see one failure shape per operation.

pub mod executor;
pub mod insights;
pub mod query;
pub mod results;

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::extract::PeriodDescriptor;
pub use executor::{QueryExecutor, Row};
pub use insights::{compute_variation, derive_insights};
pub use query::{AnalyticalQuery, QueryParam, DEFAULT_SUPERVISOR_LIMIT, DEFAULT_TOPIC_LIMIT};
pub use results::{shape_results, Record, ResultMap};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("No se encontraron datos para el lema: {topic}")]
    NoData { topic: String },

    #[error("No hay datos para comparar")]
    NothingToCompare,

    #[error("No hay datos disponibles")]
    NoStats,

    #[error("periodo inválido: {0} (se esperaba YYYY-MM)")]
    InvalidPeriod(String),
}

/// A successful topic analysis.
#[derive(Debug, Clone, Serialize)]
pub struct TopicAnalysis {
    pub topic: String,
    pub period: Option<PeriodDescriptor>,
    pub data: ResultMap,
    pub insights: Vec<String>,
    pub query: AnalyticalQuery,
}

impl TopicAnalysis {
    /// Σ frecuencia over the topic partition.
    pub fn total_cases(&self) -> u64 {
        self.data
            .get(results::TOPICS_KEY)
            .map(|rows| {
                rows.iter()
                    .filter_map(|r| insights::number(r, "frecuencia"))
                    .sum::<f64>() as u64
            })
            .unwrap_or(0)
    }
}

/// Rows of a comparison, general stats or ranking query plus the query itself.
#[derive(Debug, Clone, Serialize)]
pub struct QueryOutcome {
    pub data: Vec<Row>,
    pub query: AnalyticalQuery,
}

pub struct AnalysisEngine {
    executor: Arc<dyn QueryExecutor>,
    topic_limit: usize,
}

impl AnalysisEngine {
    pub fn new(executor: Arc<dyn QueryExecutor>) -> Self {
        Self::with_topic_limit(executor, DEFAULT_TOPIC_LIMIT)
    }

    pub fn with_topic_limit(executor: Arc<dyn QueryExecutor>, topic_limit: usize) -> Self {
        Self {
            executor,
            topic_limit,
        }
    }

    /// Run `query`, logging and swallowing backend failures as "no rows".
    fn run(&self, query: &AnalyticalQuery, operation: &'static str) -> Vec<Row> {
        match self.executor.execute(query) {
            Ok(rows) => {
                tracing::debug!(operation, rows = rows.len(), "query executed");
                rows
            }
            Err(e) => {
                tracing::error!(operation, error = %e, "query execution failed");
                Vec::new()
            }
        }
    }

    /// Analyze every transcript matching `topic`, optionally within one month.
    pub fn analyze_topic(
        &self,
        topic: &str,
        period: Option<&PeriodDescriptor>,
    ) -> Result<TopicAnalysis, AnalysisError> {
        let query = query::build_topic_analysis(topic, period, self.topic_limit);
        let rows = self.run(&query, "analyze_topic");

        if rows.is_empty() {
            tracing::info!(topic, "no data for topic");
            return Err(AnalysisError::NoData {
                topic: topic.to_string(),
            });
        }

        let data = shape_results(rows);
        let insights = derive_insights(topic, &data);
        tracing::info!(topic, insights = insights.len(), "topic analyzed");

        Ok(TopicAnalysis {
            topic: topic.to_string(),
            period: period.cloned(),
            data,
            insights,
            query,
        })
    }

    /// Compare `topic` across two `YYYY-MM` months.
    pub fn compare_periods(
        &self,
        topic: &str,
        period1: &str,
        period2: &str,
    ) -> Result<QueryOutcome, AnalysisError> {
        let p1 = PeriodDescriptor::parse(period1)
            .ok_or_else(|| AnalysisError::InvalidPeriod(period1.to_string()))?;
        let p2 = PeriodDescriptor::parse(period2)
            .ok_or_else(|| AnalysisError::InvalidPeriod(period2.to_string()))?;

        let query = query::build_period_comparison(topic, &p1, &p2);
        let data = self.run(&query, "compare_periods");
        if data.is_empty() {
            return Err(AnalysisError::NothingToCompare);
        }
        Ok(QueryOutcome { data, query })
    }

    /// Dataset-wide totals.
    pub fn general_stats(&self) -> Result<QueryOutcome, AnalysisError> {
        let query = query::build_general_stats();
        let data = self.run(&query, "general_stats");
        if data.is_empty() {
            return Err(AnalysisError::NoStats);
        }
        Ok(QueryOutcome { data, query })
    }

    pub fn top_supervisors(&self, topic: &str, limit: usize) -> Result<QueryOutcome, AnalysisError> {
        let query = query::build_top_supervisors(topic, limit);
        let data = self.run(&query, "top_supervisors");
        if data.is_empty() {
            return Err(AnalysisError::NoData {
                topic: topic.to_string(),
            });
        }
        Ok(QueryOutcome { data, query })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::sync::Mutex;

    /// Returns canned rows and records every query it sees.
    struct CannedExecutor {
        rows: Result<Vec<Row>, String>,
        seen: Mutex<Vec<AnalyticalQuery>>,
    }

    impl CannedExecutor {
        fn rows(rows: Vec<Value>) -> Arc<Self> {
            Arc::new(Self {
                rows: Ok(rows
                    .into_iter()
                    .map(|v| v.as_object().unwrap().clone())
                    .collect()),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                rows: Err("connection refused".into()),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    impl QueryExecutor for CannedExecutor {
        fn execute(&self, query: &AnalyticalQuery) -> anyhow::Result<Vec<Row>> {
            self.seen.lock().unwrap().push(query.clone());
            self.rows.clone().map_err(|e| anyhow::anyhow!(e))
        }
    }

    #[test]
    fn analyze_topic_shapes_and_derives() {
        let executor = CannedExecutor::rows(vec![
            json!({"tipo_resultado": "temas", "datos": r#"[{"temas":"juicio","frecuencia":80,"duracion_promedio":120},{"temas":"pago","frecuencia":20,"duracion_promedio":60}]"#}),
            json!({"tipo_resultado": "temporal", "datos": r#"[{"mes":"2024-01","casos":10},{"mes":"2024-02","casos":20}]"#}),
        ]);
        let engine = AnalysisEngine::new(executor.clone());

        let analysis = engine.analyze_topic("juicio", None).unwrap();
        assert_eq!(analysis.total_cases(), 100);
        assert_eq!(analysis.data.len(), 2);
        assert_eq!(analysis.insights.len(), 3);
        assert!(analysis.insights[1].contains("+100.0%"));
        assert_eq!(executor.seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn empty_rows_are_no_data() {
        let engine = AnalysisEngine::new(CannedExecutor::rows(vec![]));
        let err = engine.analyze_topic("nada", None).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::NoData {
                topic: "nada".into()
            }
        );
        assert_eq!(err.to_string(), "No se encontraron datos para el lema: nada");
    }

    #[test]
    fn executor_failure_is_no_data() {
        let engine = AnalysisEngine::new(CannedExecutor::failing());
        assert!(matches!(
            engine.analyze_topic("pago", None),
            Err(AnalysisError::NoData { .. })
        ));
        assert_eq!(engine.general_stats().unwrap_err(), AnalysisError::NoStats);
    }

    #[test]
    fn analysis_keeps_period_and_query() {
        let executor = CannedExecutor::rows(vec![
            json!({"tipo_resultado": "temas", "datos": [{"temas": "pago", "frecuencia": 1}]}),
        ]);
        let engine = AnalysisEngine::with_topic_limit(executor, 7);
        let period = PeriodDescriptor::month(2024, 5).unwrap();

        let analysis = engine.analyze_topic("pago", Some(&period)).unwrap();
        assert_eq!(analysis.period.as_ref().map(|p| p.value()), Some("2024-05"));
        assert_eq!(analysis.query.param(":limite"), Some(&QueryParam::Integer(7)));
    }

    #[test]
    fn compare_periods_rejects_bad_months() {
        let executor = CannedExecutor::rows(vec![json!({"periodo": "2024-01", "casos": 1})]);
        let engine = AnalysisEngine::new(executor.clone());

        assert_eq!(
            engine.compare_periods("pago", "2024-13", "2024-01").unwrap_err(),
            AnalysisError::InvalidPeriod("2024-13".into())
        );
        assert!(executor.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn empty_results_fail_for_every_shape() {
        let engine = AnalysisEngine::new(CannedExecutor::rows(vec![]));
        assert_eq!(
            engine.compare_periods("pago", "2024-01", "2024-02").unwrap_err(),
            AnalysisError::NothingToCompare
        );
        assert_eq!(engine.general_stats().unwrap_err(), AnalysisError::NoStats);
        assert!(matches!(
            engine.top_supervisors("pago", 5),
            Err(AnalysisError::NoData { .. })
        ));
    }

    #[test]
    fn compare_periods_passes_rows_through() {
        let executor = CannedExecutor::rows(vec![
            json!({"periodo": "2024-01", "casos": 4, "variacion_porcentual": null}),
            json!({"periodo": "2024-02", "casos": 6, "variacion_porcentual": 50.0}),
        ]);
        let engine = AnalysisEngine::new(executor);
        let outcome = engine.compare_periods("pago", "2024-01", "2024-02").unwrap();
        assert_eq!(outcome.data.len(), 2);
        assert_eq!(outcome.data[1]["casos"], 6);
    }
}
