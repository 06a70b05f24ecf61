//! Query synthesis: turns a (topic, period) pair into parameterized SQL.
//!
//! Every builder is a pure function. Topic, period bounds, thresholds and limits
//! travel as named bind parameters (`:lema`, `:umbral`, `:limite`, ...), never as
//! spliced literals, so model output can't reach the SQL text. Multi-shape results
//! carry a `tipo_resultado` discriminator and a JSON `datos` payload.

use serde::Serialize;

use crate::extract::period::PeriodDescriptor;

/// Minimum trigram similarity between `lemas` and the topic for a transcript to match.
pub const SIMILARITY_THRESHOLD: f64 = 0.4;

/// Default row cap for the topic-frequency partition.
pub const DEFAULT_TOPIC_LIMIT: usize = 20;

/// Default row cap for the supervisor ranking.
pub const DEFAULT_SUPERVISOR_LIMIT: usize = 10;

/// A bind value for a named query parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryParam {
    Text(String),
    Integer(i64),
    Real(f64),
}

/// Query text plus its named parameters, ready for a [`QueryExecutor`](super::executor::QueryExecutor).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticalQuery {
    pub sql: String,
    pub params: Vec<(&'static str, QueryParam)>,
}

impl AnalyticalQuery {
    /// Look up a bound parameter by name (including the leading `:`).
    pub fn param(&self, name: &str) -> Option<&QueryParam> {
        self.params
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, value)| value)
    }
}

fn limit_param(limit: usize) -> QueryParam {
    QueryParam::Integer(i64::try_from(limit).unwrap_or(i64::MAX))
}

/// Topic analysis: a frequency breakdown by detected topic (`temas`) and a
/// monthly series (`temporal`) over every transcript matching `topic`.
pub fn build_topic_analysis(
    topic: &str,
    period: Option<&PeriodDescriptor>,
    limit: usize,
) -> AnalyticalQuery {
    let mut params = vec![
        (":lema", QueryParam::Text(topic.to_string())),
        (":umbral", QueryParam::Real(SIMILARITY_THRESHOLD)),
        (":limite", limit_param(limit)),
    ];

    let period_filter = match period {
        Some(p) => {
            params.push((":periodo_inicio", QueryParam::Text(p.month_start())));
            "\n      AND date(fecha, 'start of month') = :periodo_inicio"
        }
        None => "",
    };

    let sql = format!(
        r#"-- Análisis por lema
WITH casos_filtrados AS (
    SELECT
        uid,
        date(fecha) AS fecha,
        region,
        supervisor,
        temas_detectados,
        duracion_seg,
        lemas,
        similarity(lemas, :lema) AS score
    FROM transcripciones_procesadas
    WHERE similarity(lemas, :lema) > :umbral{period_filter}
),
agregacion_temas AS (
    SELECT
        temas_detectados,
        COUNT(*) AS frecuencia,
        AVG(duracion_seg) AS duracion_promedio,
        AVG(score) AS similitud_promedio
    FROM casos_filtrados
    GROUP BY temas_detectados
    ORDER BY frecuencia DESC
    LIMIT :limite
),
distribucion_temporal AS (
    SELECT
        strftime('%Y-%m', fecha) AS mes,
        COUNT(*) AS casos,
        AVG(duracion_seg) AS duracion_promedio
    FROM casos_filtrados
    GROUP BY strftime('%Y-%m', fecha)
    ORDER BY mes
)
SELECT
    'temas' AS tipo_resultado,
    json_group_array(
        json_object(
            'temas', temas_detectados,
            'frecuencia', frecuencia,
            'duracion_promedio', ROUND(duracion_promedio, 2),
            'similitud', ROUND(similitud_promedio, 3)
        ) ORDER BY frecuencia DESC
    ) AS datos
FROM agregacion_temas
HAVING COUNT(*) > 0

UNION ALL

SELECT
    'temporal' AS tipo_resultado,
    json_group_array(
        json_object(
            'mes', mes,
            'casos', casos,
            'duracion_promedio', ROUND(duracion_promedio, 2)
        ) ORDER BY mes
    ) AS datos
FROM distribucion_temporal
HAVING COUNT(*) > 0"#
    );

    AnalyticalQuery { sql, params }
}

/// Case count and mean duration for `topic` in two months, with the percent
/// change of each row against the previous one in period order. The variation is
/// NULL when the earlier count is zero.
pub fn build_period_comparison(
    topic: &str,
    period1: &PeriodDescriptor,
    period2: &PeriodDescriptor,
) -> AnalyticalQuery {
    let sql = r#"-- Comparación de periodos por lema
WITH periodo_1 AS (
    SELECT
        COUNT(*) AS casos,
        AVG(duracion_seg) AS duracion_promedio,
        :periodo1 AS periodo
    FROM transcripciones_procesadas
    WHERE similarity(lemas, :lema) > :umbral
      AND date(fecha, 'start of month') = :periodo1_inicio
),
periodo_2 AS (
    SELECT
        COUNT(*) AS casos,
        AVG(duracion_seg) AS duracion_promedio,
        :periodo2 AS periodo
    FROM transcripciones_procesadas
    WHERE similarity(lemas, :lema) > :umbral
      AND date(fecha, 'start of month') = :periodo2_inicio
)
SELECT
    periodo,
    casos,
    ROUND(duracion_promedio, 2) AS duracion_promedio,
    ROUND(
        100.0 * (casos - LAG(casos) OVER (ORDER BY periodo)) /
        NULLIF(LAG(casos) OVER (ORDER BY periodo), 0),
        2
    ) AS variacion_porcentual
FROM (
    SELECT * FROM periodo_1
    UNION ALL
    SELECT * FROM periodo_2
) AS combined
ORDER BY periodo"#;

    AnalyticalQuery {
        sql: sql.to_string(),
        params: vec![
            (":lema", QueryParam::Text(topic.to_string())),
            (":umbral", QueryParam::Real(SIMILARITY_THRESHOLD)),
            (":periodo1", QueryParam::Text(period1.value().to_string())),
            (":periodo1_inicio", QueryParam::Text(period1.month_start())),
            (":periodo2", QueryParam::Text(period2.value().to_string())),
            (":periodo2_inicio", QueryParam::Text(period2.month_start())),
        ],
    }
}

/// Dataset-wide totals. Single row, or no row at all when the table is empty.
pub fn build_general_stats() -> AnalyticalQuery {
    let sql = r#"-- Estadísticas generales
SELECT
    COUNT(*) AS total_registros,
    COUNT(DISTINCT date(fecha)) AS dias_unicos,
    MIN(date(fecha)) AS fecha_min,
    MAX(date(fecha)) AS fecha_max,
    COUNT(DISTINCT region) AS regiones,
    COUNT(DISTINCT supervisor) AS supervisores,
    ROUND(AVG(duracion_seg), 2) AS duracion_promedio,
    ROUND(AVG(num_turnos_cliente), 2) AS turnos_promedio
FROM transcripciones_procesadas
HAVING COUNT(*) > 0"#;

    AnalyticalQuery {
        sql: sql.to_string(),
        params: Vec::new(),
    }
}

/// Supervisors handling the most transcripts that match `topic`.
pub fn build_top_supervisors(topic: &str, limit: usize) -> AnalyticalQuery {
    let sql = r#"-- Supervisores principales por lema
SELECT
    supervisor,
    COUNT(*) AS casos,
    ROUND(AVG(duracion_seg), 2) AS duracion_promedio,
    ROUND(AVG(similarity(lemas, :lema)), 3) AS similitud_promedio
FROM transcripciones_procesadas
WHERE similarity(lemas, :lema) > :umbral
  AND supervisor IS NOT NULL
GROUP BY supervisor
ORDER BY casos DESC, supervisor
LIMIT :limite"#;

    AnalyticalQuery {
        sql: sql.to_string(),
        params: vec![
            (":lema", QueryParam::Text(topic.to_string())),
            (":umbral", QueryParam::Real(SIMILARITY_THRESHOLD)),
            (":limite", limit_param(limit)),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn march() -> PeriodDescriptor {
        PeriodDescriptor::month(2024, 3).unwrap()
    }

    #[test]
    fn topic_analysis_binds_topic_instead_of_splicing_it() {
        let query = build_topic_analysis("alquiler'; DROP TABLE x; --", None, 20);
        assert!(!query.sql.contains("DROP TABLE"));
        assert_eq!(
            query.param(":lema"),
            Some(&QueryParam::Text("alquiler'; DROP TABLE x; --".into()))
        );
        assert_eq!(query.param(":umbral"), Some(&QueryParam::Real(0.4)));
        assert_eq!(query.param(":limite"), Some(&QueryParam::Integer(20)));
    }

    #[test]
    fn topic_analysis_tags_both_partitions() {
        let query = build_topic_analysis("pago", None, DEFAULT_TOPIC_LIMIT);
        assert!(query.sql.contains("'temas' AS tipo_resultado"));
        assert!(query.sql.contains("'temporal' AS tipo_resultado"));
        assert!(query.sql.contains("UNION ALL"));
        assert!(query.sql.contains("ORDER BY frecuencia DESC"));
    }

    #[test]
    fn topic_analysis_without_period_has_no_period_param() {
        let query = build_topic_analysis("pago", None, 5);
        assert!(query.param(":periodo_inicio").is_none());
        assert!(!query.sql.contains(":periodo_inicio"));
    }

    #[test]
    fn topic_analysis_with_period_binds_month_start() {
        let period = march();
        let query = build_topic_analysis("pago", Some(&period), 5);
        assert!(query.sql.contains("date(fecha, 'start of month') = :periodo_inicio"));
        assert_eq!(
            query.param(":periodo_inicio"),
            Some(&QueryParam::Text("2024-03-01".into()))
        );
    }

    #[test]
    fn period_comparison_guards_division() {
        let p1 = march();
        let p2 = PeriodDescriptor::month(2024, 4).unwrap();
        let query = build_period_comparison("deuda", &p1, &p2);
        assert!(query.sql.contains("NULLIF(LAG(casos) OVER (ORDER BY periodo), 0)"));
        assert_eq!(query.param(":periodo1"), Some(&QueryParam::Text("2024-03".into())));
        assert_eq!(
            query.param(":periodo2_inicio"),
            Some(&QueryParam::Text("2024-04-01".into()))
        );
    }

    #[test]
    fn general_stats_has_no_params() {
        let query = build_general_stats();
        assert!(query.params.is_empty());
        assert!(query.sql.contains("COUNT(DISTINCT supervisor) AS supervisores"));
    }

    #[test]
    fn top_supervisors_binds_limit() {
        let query = build_top_supervisors("juicio", 3);
        assert_eq!(query.param(":limite"), Some(&QueryParam::Integer(3)));
        assert!(query.sql.contains("supervisor IS NOT NULL"));
    }
}
